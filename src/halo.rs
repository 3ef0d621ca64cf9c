//! Ghost row exchange between neighbouring bands.
//!
//! The order of sends and receives is fixed per worker by the parity of its
//! id. Over a transport without buffering every send must meet a receive
//! that is already posted, so each pair of neighbours has to run
//! complementary halves of the same exchange:
//!
//! ```text
//!    odd worker            even worker
//!  send   up   (id-1)    recv down (id+1)
//!  recv   up   (id-1)    send down (id+1)
//!  send   down (id+1)    recv up   (id-1)
//!  recv   down (id+1)    send up   (id-1)
//! ```
//!
//! Steps toward a missing neighbour are dropped. Worker 0 is even and never
//! has an upward neighbour, a lone worker has no steps at all.

use crate::comm::*;
use crate::domain::*;
use crate::error::*;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operation {
    Send,
    Receive,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ExchangeStep {
    pub direction: Direction,
    pub operation: Operation,
}

impl ExchangeStep {
    pub const fn new(direction: Direction, operation: Operation) -> Self {
        ExchangeStep {
            direction,
            operation,
        }
    }

    /// Id of the neighbour this step talks to.
    pub fn peer(&self, worker: usize) -> usize {
        match self.direction {
            Direction::Up => worker - 1,
            Direction::Down => worker + 1,
        }
    }
}

/// Ordered send/receive plan for one worker, computed once per run.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExchangeSchedule {
    worker: usize,
    steps: Vec<ExchangeStep>,
}

impl ExchangeSchedule {
    pub fn new(worker: usize, is_first: bool, is_last: bool) -> Self {
        use Direction::*;
        use Operation::*;

        let has_up = !is_first && worker > 0;
        let has_down = !is_last;
        let mut steps = Vec::with_capacity(4);

        if worker % 2 == 1 {
            if has_up {
                steps.push(ExchangeStep::new(Up, Send));
                steps.push(ExchangeStep::new(Up, Receive));
            }
            if has_down {
                steps.push(ExchangeStep::new(Down, Send));
                steps.push(ExchangeStep::new(Down, Receive));
            }
        } else {
            if has_down {
                steps.push(ExchangeStep::new(Down, Receive));
                steps.push(ExchangeStep::new(Down, Send));
            }
            if has_up {
                steps.push(ExchangeStep::new(Up, Receive));
                steps.push(ExchangeStep::new(Up, Send));
            }
        }

        ExchangeSchedule { worker, steps }
    }

    /// Schedule for `worker` out of `workers`.
    pub fn for_worker(worker: usize, workers: usize) -> Self {
        Self::new(worker, worker == 0, worker + 1 == workers)
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn steps(&self) -> &[ExchangeStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Refresh the ghost rows of `band` from its neighbours, following `schedule`.
/// Only ghost rows are written.
pub fn exchange<C: Communicator + ?Sized>(
    band: &mut Band,
    schedule: &ExchangeSchedule,
    comm: &C,
) -> HeatResult<()> {
    profiling::scope!("halo::exchange");
    let worker = schedule.worker();
    for step in schedule.steps() {
        let peer = step.peer(worker);
        match step.operation {
            Operation::Send => {
                comm.send(peer, HALO_TAG, band.boundary_row(step.direction))?;
            }
            Operation::Receive => {
                let ghost = band.ghost_row_mut(step.direction).ok_or_else(|| {
                    HeatError::invalid(format!(
                        "worker {} has no {:?} ghost row to receive into",
                        worker, step.direction
                    ))
                })?;
                comm.recv(peer, HALO_TAG, ghost)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::partition::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    const UP_SEND: ExchangeStep = ExchangeStep::new(Direction::Up, Operation::Send);
    const UP_RECV: ExchangeStep = ExchangeStep::new(Direction::Up, Operation::Receive);
    const DOWN_SEND: ExchangeStep = ExchangeStep::new(Direction::Down, Operation::Send);
    const DOWN_RECV: ExchangeStep = ExchangeStep::new(Direction::Down, Operation::Receive);

    /// Run per-worker step lists against a strict rendezvous matcher:
    /// a step only completes when the peer's next pending step is the
    /// matching opposite operation. Returns true if every list drains.
    fn rendezvous_completes(schedules: Vec<Vec<ExchangeStep>>) -> bool {
        let workers = schedules.len();
        let mut pending: Vec<VecDeque<ExchangeStep>> =
            schedules.into_iter().map(VecDeque::from).collect();

        loop {
            if pending.iter().all(|p| p.is_empty()) {
                return true;
            }
            let mut progressed = false;
            for w in 0..workers {
                let Some(step) = pending[w].front().copied() else {
                    continue;
                };
                let peer = step.peer(w);
                let Some(other) = pending[peer].front().copied() else {
                    continue;
                };
                if other.peer(peer) == w
                    && other.direction == step.direction.opposite()
                    && other.operation != step.operation
                {
                    pending[w].pop_front();
                    pending[peer].pop_front();
                    progressed = true;
                }
            }
            if !progressed {
                return false;
            }
        }
    }

    fn parity_schedules(workers: usize) -> Vec<Vec<ExchangeStep>> {
        (0..workers)
            .map(|w| ExchangeSchedule::for_worker(w, workers).steps().to_vec())
            .collect()
    }

    #[test]
    fn schedule_shapes_test() {
        assert!(ExchangeSchedule::for_worker(0, 1).is_empty());
        assert_eq!(ExchangeSchedule::for_worker(0, 3).steps(), &[DOWN_RECV, DOWN_SEND]);
        assert_eq!(
            ExchangeSchedule::for_worker(1, 3).steps(),
            &[UP_SEND, UP_RECV, DOWN_SEND, DOWN_RECV]
        );
        assert_eq!(ExchangeSchedule::for_worker(2, 3).steps(), &[UP_RECV, UP_SEND]);
        assert_eq!(
            ExchangeSchedule::for_worker(2, 4).steps(),
            &[DOWN_RECV, DOWN_SEND, UP_RECV, UP_SEND]
        );
        assert_eq!(ExchangeSchedule::for_worker(3, 4).steps(), &[UP_SEND, UP_RECV]);
        assert_eq!(ExchangeSchedule::new(4, true, false).steps(), &[DOWN_RECV, DOWN_SEND]);
    }

    #[test]
    fn schedules_never_deadlock() {
        for workers in 1..=16 {
            assert!(
                rendezvous_completes(parity_schedules(workers)),
                "deadlock with {} workers",
                workers
            );
        }
    }

    #[test]
    fn send_first_everywhere_deadlocks() {
        // Without the parity split every worker blocks in its first send.
        for workers in 2..=6 {
            let naive = (0..workers)
                .map(|w| {
                    let mut steps = Vec::new();
                    if w > 0 {
                        steps.extend([UP_SEND, UP_RECV]);
                    }
                    if w + 1 < workers {
                        steps.extend([DOWN_SEND, DOWN_RECV]);
                    }
                    steps
                })
                .collect();
            assert!(!rendezvous_completes(naive));
        }
    }

    proptest! {
        #[test]
        fn neighbours_are_complementary(workers in 2usize..64, w in 0usize..63) {
            prop_assume!(w + 1 < workers);
            let upper = ExchangeSchedule::for_worker(w, workers);
            let lower = ExchangeSchedule::for_worker(w + 1, workers);
            let upper_ops: Vec<_> = upper
                .steps()
                .iter()
                .filter(|s| s.direction == Direction::Down)
                .map(|s| s.operation)
                .collect();
            let lower_ops: Vec<_> = lower
                .steps()
                .iter()
                .filter(|s| s.direction == Direction::Up)
                .map(|s| s.operation)
                .collect();
            prop_assert_eq!(upper_ops.len(), 2);
            prop_assert_eq!(lower_ops.len(), 2);
            for (a, b) in upper_ops.iter().zip(lower_ops.iter()) {
                prop_assert_ne!(a, b);
            }
        }
    }

    fn run_exchange(rows: usize, workers: usize) -> Vec<Band> {
        let table = partition(rows, workers).unwrap();
        let world = ChannelComm::world(workers);
        std::thread::scope(|s| {
            let handles: Vec<_> = world
                .into_iter()
                .map(|comm| {
                    let table = &table;
                    s.spawn(move || {
                        let w = comm.rank();
                        let owned = table.owned_aabb(w, rows);
                        let mut band = Band::new(table, w, rows).unwrap();
                        // Owned rows get their world value, ghosts a marker.
                        band.par_set_values(
                            |c| {
                                if owned.contains(&c) {
                                    (c[0] * 100 + c[1]) as f64
                                } else {
                                    -1.0
                                }
                            },
                            4,
                        );
                        let schedule = ExchangeSchedule::for_worker(w, workers);
                        exchange(&mut band, &schedule, &comm).unwrap();
                        band
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn single_worker_noop_test() {
        let bands = run_exchange(5, 1);
        assert_eq!(bands[0].ghost_count(), 0);
        for c in bands[0].aabb().coord_iter() {
            assert_eq!(bands[0].view(&c), (c[0] * 100 + c[1]) as f64);
        }
    }

    #[test]
    fn ghosts_match_neighbours_test() {
        for (rows, workers) in [(2, 2), (6, 3), (7, 3), (11, 4), (9, 5), (8, 8)] {
            let bands = run_exchange(rows, workers);
            for (w, band) in bands.iter().enumerate() {
                if w > 0 {
                    assert_eq!(
                        band.ghost_row(Direction::Up).unwrap(),
                        bands[w - 1].boundary_row(Direction::Down)
                    );
                }
                if w + 1 < workers {
                    assert_eq!(
                        band.ghost_row(Direction::Down).unwrap(),
                        bands[w + 1].boundary_row(Direction::Up)
                    );
                }
                // Every stored cell now equals its world value.
                for c in band.aabb().coord_iter() {
                    assert_eq!(band.view(&c), (c[0] * 100 + c[1]) as f64);
                }
            }
        }
    }

    #[test]
    fn missing_peer_fails_test() {
        let table = partition(4, 2).unwrap();
        let mut world = ChannelComm::world(2);
        let comm0 = world.remove(0);
        drop(world);
        let mut band = Band::new(&table, 0, 4).unwrap();
        let schedule = ExchangeSchedule::for_worker(0, 2);
        let r = exchange(&mut band, &schedule, &comm0);
        assert!(matches!(r, Err(HeatError::CommunicationFailure { .. })));
    }
}
