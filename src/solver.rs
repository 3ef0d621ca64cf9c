//! Time-stepping driver.
//!
//! Every worker runs the same state machine:
//! `Initializing -> Stepping -> Collecting -> Done`, or `Aborted` on the
//! first error. The two band buffers are swapped after every half step
//! instead of copied.

use crate::collector;
use crate::comm::*;
use crate::domain::*;
use crate::error::*;
use crate::halo::*;
use crate::initial_conditions::*;
use crate::partition::*;
use crate::stencil;
use std::path::PathBuf;

/// The four numbers that define a run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeatParameters {
    pub alpha: f64,
    pub beta: f64,
    pub grid_size: usize,
    pub time_horizon: f64,
}

impl HeatParameters {
    pub fn validate(&self) -> HeatResult<()> {
        if self.grid_size == 0 {
            return Err(HeatError::invalid("grid size must be positive"));
        }
        if !self.alpha.is_finite() || self.alpha == 0.0 {
            return Err(HeatError::invalid(format!(
                "alpha must be finite and non-zero, got {}",
                self.alpha
            )));
        }
        if !self.beta.is_finite() {
            return Err(HeatError::invalid(format!(
                "beta must be finite, got {}",
                self.beta
            )));
        }
        if !self.time_horizon.is_finite() || self.time_horizon < 0.0 {
            return Err(HeatError::invalid(format!(
                "time horizon must be finite and non-negative, got {}",
                self.time_horizon
            )));
        }
        Ok(())
    }

    pub fn basis(&self) -> BasisParameters {
        BasisParameters {
            alpha: self.alpha,
            beta: self.beta,
        }
    }
}

/// Step sizes and iteration count derived from grid size and time horizon.
///
/// The time step is pinned to the stability limit `h^2 / 4` rather than
/// searched for, so the step count is conservative.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepPlan {
    pub spatial_step: f64,
    pub time_step: f64,
    pub theta_ratio: f64,
    /// Driver iterations, each of which is two time steps.
    pub required_steps: usize,
}

impl StepPlan {
    pub fn new(grid_size: usize, time_horizon: f64) -> HeatResult<Self> {
        if grid_size == 0 {
            return Err(HeatError::invalid("grid size must be positive"));
        }
        if grid_size == 1 {
            // A single cell is all boundary.
            return Ok(StepPlan {
                spatial_step: f64::INFINITY,
                time_step: f64::INFINITY,
                theta_ratio: 0.25,
                required_steps: 0,
            });
        }

        let h = 1.0 / (grid_size - 1) as f64;
        let t = h * h / 4.0;
        let theta_ratio = t / (h * h);

        let time_steps = (time_horizon / t).ceil();
        if !time_steps.is_finite() || time_steps < 0.0 || time_steps >= usize::MAX as f64 {
            return Err(HeatError::invalid(format!(
                "time horizon {} cannot be covered in steps of {}",
                time_horizon, t
            )));
        }
        let required_steps = (time_steps as usize).div_ceil(2);

        Ok(StepPlan {
            spatial_step: h,
            time_step: t,
            theta_ratio,
            required_steps,
        })
    }
}

/// Everything the driver needs, passed in rather than read from globals.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub params: HeatParameters,
    /// Number of in-process workers. MPI runs use the world size instead.
    pub workers: usize,
    /// Rows per rayon task in the local stencil update.
    pub chunk_size: usize,
    /// Worker that owns the full grid.
    pub root: usize,
    pub output: PathBuf,
}

impl SolverConfig {
    pub fn new(params: HeatParameters, workers: usize) -> Self {
        SolverConfig {
            params,
            workers,
            chunk_size: 16,
            root: 0,
            output: PathBuf::from("heat_result.txt"),
        }
    }

    pub fn validate(&self) -> HeatResult<()> {
        self.params.validate()?;
        if self.workers == 0 {
            return Err(HeatError::invalid("at least one worker is required"));
        }
        if self.workers > self.params.grid_size {
            return Err(HeatError::invalid(format!(
                "more workers ({}) than grid rows ({})",
                self.workers, self.params.grid_size
            )));
        }
        if self.root >= self.workers {
            return Err(HeatError::invalid(format!(
                "coordinator {} is not one of {} workers",
                self.root, self.workers
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SolverState {
    Initializing,
    Stepping,
    Collecting,
    Done,
    Aborted,
}

/// One worker's view of a run.
pub struct Worker<'a, C: Communicator + ?Sized> {
    comm: &'a C,
    config: &'a SolverConfig,
    table: PartitionTable,
    plan: StepPlan,
    schedule: ExchangeSchedule,
    state: SolverState,
}

impl<'a, C: Communicator + ?Sized> Worker<'a, C> {
    pub fn new(comm: &'a C, config: &'a SolverConfig) -> HeatResult<Self> {
        let mut effective = config.clone();
        effective.workers = comm.size();
        effective.validate()?;

        let table = partition(config.params.grid_size, comm.size())?;
        let plan = StepPlan::new(config.params.grid_size, config.params.time_horizon)?;
        let schedule = ExchangeSchedule::for_worker(comm.rank(), comm.size());
        Ok(Worker {
            comm,
            config,
            table,
            plan,
            schedule,
            state: SolverState::Initializing,
        })
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn plan(&self) -> &StepPlan {
        &self.plan
    }

    pub fn table(&self) -> &PartitionTable {
        &self.table
    }

    fn is_root(&self) -> bool {
        self.comm.rank() == self.config.root
    }

    fn transition(&mut self, state: SolverState) {
        log::debug!(
            "worker {}: {:?} -> {:?}",
            self.comm.rank(),
            self.state,
            state
        );
        self.state = state;
    }

    /// Run to completion. Only the root passes `initial` and only the root
    /// gets a grid back.
    pub fn run(&mut self, initial: Option<&Grid>) -> HeatResult<Option<Grid>> {
        match self.run_states(initial) {
            Ok(grid) => Ok(grid),
            Err(e) => {
                log::error!("worker {} aborted in {:?}: {}", self.comm.rank(), self.state, e);
                self.state = SolverState::Aborted;
                Err(e)
            }
        }
    }

    fn run_states(&mut self, initial: Option<&Grid>) -> HeatResult<Option<Grid>> {
        self.transition(SolverState::Initializing);
        let input = if self.is_root() { initial } else { None };
        let mut current = collector::scatter(self.comm, self.config.root, input, &self.table)?;
        let mut next = Band::new(&self.table, self.comm.rank(), self.table.rows())?;
        next.copy_edges_from(&current)?;

        self.transition(SolverState::Stepping);
        for _ in 0..self.plan.required_steps {
            self.half_step(&mut current, &mut next)?;
            self.half_step(&mut current, &mut next)?;
        }

        self.transition(SolverState::Collecting);
        let grid = collector::gather(self.comm, self.config.root, &current, &self.table)?;

        drop(next);
        drop(current);
        self.transition(SolverState::Done);
        Ok(grid)
    }

    /// Exchange ghosts of `current`, update into `next`, then swap the names.
    fn half_step(&self, current: &mut Band, next: &mut Band) -> HeatResult<()> {
        exchange(current, &self.schedule, self.comm)?;
        stencil::update(self.plan.theta_ratio, current, next, self.config.chunk_size)?;
        std::mem::swap(current, next);
        Ok(())
    }
}

/// Everything one worker does: the root builds the initial grid, then all
/// workers step and the root receives the final grid.
pub fn run_worker<C: Communicator + ?Sized>(
    comm: &C,
    config: &SolverConfig,
) -> HeatResult<Option<Grid>> {
    let mut worker = Worker::new(comm, config)?;
    let initial = if comm.rank() == config.root {
        log::info!(
            "{}x{} grid, {} workers, row counts {:?}, {} double steps of {:e}",
            config.params.grid_size,
            config.params.grid_size,
            comm.size(),
            worker.table().row_counts(),
            worker.plan().required_steps,
            worker.plan().time_step
        );
        Some(generate_grid(
            config.params.basis(),
            config.params.grid_size,
            config.chunk_size,
        )?)
    } else {
        None
    };
    let grid = worker.run(initial.as_ref())?;
    if grid.is_some() {
        log::info!(
            "collected final grid after {} double steps",
            worker.plan().required_steps
        );
    }
    Ok(grid)
}

/// Run `config.workers` workers on their own threads, connected by
/// rendezvous channels, and return the root's final grid.
pub fn run_threaded(config: &SolverConfig) -> HeatResult<Grid> {
    config.validate()?;
    let world = ChannelComm::world(config.workers);
    let results: Vec<HeatResult<Option<Grid>>> = std::thread::scope(|s| {
        let handles: Vec<_> = world
            .into_iter()
            .map(|comm| s.spawn(move || run_worker(&comm, config)))
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join().unwrap_or_else(|_| {
                    Err(HeatError::communication(rank, rank, "worker panicked"))
                })
            })
            .collect()
    });
    collect_root(results, config.root)
}

/// Pick the root's grid, or the most telling error. A failure in one worker
/// shows up as disconnects everywhere else, so report the root cause.
fn collect_root(
    results: Vec<HeatResult<Option<Grid>>>,
    root: usize,
) -> HeatResult<Grid> {
    let mut first_error = None;
    let mut root_grid = None;
    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(grid) if rank == root => root_grid = grid,
            Ok(_) => {}
            Err(e) => {
                let replace = match (&first_error, &e) {
                    (None, _) => true,
                    (Some(HeatError::CommunicationFailure { .. }), e) => {
                        !matches!(e, HeatError::CommunicationFailure { .. })
                    }
                    _ => false,
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    root_grid.ok_or_else(|| HeatError::communication(root, root, "coordinator returned no grid"))
}
