//! Thin façade over in-process (channel) or inter-process (MPI) message passing.
//!
//! Every call blocks until its message has been handed over. Neither backend
//! promises buffering, so two workers that both send first to each other
//! deadlock; the halo schedule is what orders them.

mod channel;
#[cfg(feature = "mpi")]
mod mpi_backend;

pub use channel::*;
#[cfg(feature = "mpi")]
pub use mpi_backend::*;

use crate::error::*;

pub type Tag = u16;

pub const HALO_TAG: Tag = 0;
pub const SCATTER_TAG: Tag = 1;
pub const GATHER_TAG: Tag = 2;

/// Blocking point-to-point and variable-count collectives over `f64` rows.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn send(&self, peer: usize, tag: Tag, buf: &[f64]) -> HeatResult<()>;

    /// Receive exactly `buf.len()` values from `peer` with `tag`.
    fn recv(&self, peer: usize, tag: Tag, buf: &mut [f64]) -> HeatResult<()>;

    /// Hand `counts[i]` values starting at `offsets[i]` of the root's `send`
    /// buffer to worker `i`. Only the root passes `send`.
    fn scatter_varcount(
        &self,
        root: usize,
        send: Option<&[f64]>,
        counts: &[usize],
        offsets: &[usize],
        recv: &mut [f64],
    ) -> HeatResult<()> {
        check_layout(self, counts, offsets)?;
        check_len(self, recv.len(), counts[self.rank()])?;
        if self.rank() != root {
            return self.recv(root, SCATTER_TAG, recv);
        }

        let send = send.ok_or_else(|| {
            HeatError::invalid("scatter root has no buffer to send")
        })?;
        for peer in 0..self.size() {
            let range = offsets[peer]..offsets[peer] + counts[peer];
            let chunk = send.get(range).ok_or_else(|| {
                HeatError::invalid(format!(
                    "scatter buffer of {} values is too short for worker {}",
                    send.len(),
                    peer
                ))
            })?;
            if peer == root {
                recv.copy_from_slice(chunk);
            } else {
                self.send(peer, SCATTER_TAG, chunk)?;
            }
        }
        Ok(())
    }

    /// Collect `counts[i]` values from worker `i` into the root's `recv`
    /// buffer at `offsets[i]`. Only the root passes `recv`.
    fn gather_varcount(
        &self,
        root: usize,
        send: &[f64],
        counts: &[usize],
        offsets: &[usize],
        recv: Option<&mut [f64]>,
    ) -> HeatResult<()> {
        check_layout(self, counts, offsets)?;
        check_len(self, send.len(), counts[self.rank()])?;
        if self.rank() != root {
            return self.send(root, GATHER_TAG, send);
        }

        let recv = recv.ok_or_else(|| {
            HeatError::invalid("gather root has no buffer to receive into")
        })?;
        for peer in 0..self.size() {
            let range = offsets[peer]..offsets[peer] + counts[peer];
            let len = recv.len();
            let chunk = recv.get_mut(range).ok_or_else(|| {
                HeatError::invalid(format!(
                    "gather buffer of {} values is too short for worker {}",
                    len, peer
                ))
            })?;
            if peer == root {
                chunk.copy_from_slice(send);
            } else {
                self.recv(peer, GATHER_TAG, chunk)?;
            }
        }
        Ok(())
    }
}

fn check_layout<C: Communicator + ?Sized>(
    comm: &C,
    counts: &[usize],
    offsets: &[usize],
) -> HeatResult<()> {
    if counts.len() != comm.size() || offsets.len() != comm.size() {
        return Err(HeatError::invalid(format!(
            "collective layout has {} counts and {} offsets for {} workers",
            counts.len(),
            offsets.len(),
            comm.size()
        )));
    }
    Ok(())
}

fn check_len<C: Communicator + ?Sized>(
    comm: &C,
    len: usize,
    expected: usize,
) -> HeatResult<()> {
    if len != expected {
        return Err(HeatError::invalid(format!(
            "worker {} has a buffer of {} values, expected {}",
            comm.rank(),
            len,
            expected
        )));
    }
    Ok(())
}
