//! Error taxonomy for the solver.
//!
//! Every variant is fatal: a half-exchanged halo or half-applied stencil
//! leaves no state worth resuming from, so callers propagate and abort.

use thiserror::Error;

pub type HeatResult<T> = Result<T, HeatError>;

#[derive(Debug, Error)]
pub enum HeatError {
    /// Bad arguments or a worker layout that cannot cover the grid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A send or receive on the transport failed or delivered the wrong message.
    #[error("communication failure between worker {worker} and peer {peer}: {reason}")]
    CommunicationFailure {
        worker: usize,
        peer: usize,
        reason: String,
    },

    #[error("could not allocate a {rows}x{columns} buffer")]
    AllocationFailure { rows: usize, columns: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HeatError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        HeatError::InvalidConfiguration(reason.into())
    }

    pub fn communication(
        worker: usize,
        peer: usize,
        reason: impl Into<String>,
    ) -> Self {
        HeatError::CommunicationFailure {
            worker,
            peer,
            reason: reason.into(),
        }
    }
}

/// Allocate a zeroed `rows * columns` buffer, reporting failure instead of aborting.
pub fn try_alloc_zeroed(rows: usize, columns: usize) -> HeatResult<Vec<f64>> {
    let failure = || HeatError::AllocationFailure { rows, columns };
    let len = rows.checked_mul(columns).ok_or_else(failure)?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| failure())?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}
