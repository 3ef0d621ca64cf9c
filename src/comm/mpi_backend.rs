//! MPI backend: one worker per rank of `MPI_COMM_WORLD`.
//!
//! Point-to-point sends are synchronous (`MPI_Ssend`), so the transport gives
//! the same no-buffering guarantee as the channel backend.

use super::*;
use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator as _, Destination, Equivalence, Root, Source};
use mpi::Count;

pub struct MpiComm {
    world: SimpleCommunicator,
    _universe: mpi::environment::Universe,
}

impl MpiComm {
    /// Initialize MPI. Fails if MPI was already initialized in this process.
    pub fn init() -> HeatResult<Self> {
        let universe = mpi::initialize().ok_or_else(|| {
            HeatError::communication(0, 0, "MPI could not be initialized")
        })?;
        let world = universe.world();
        Ok(MpiComm {
            world,
            _universe: universe,
        })
    }

    /// Tear down every rank. MPI gives no other way to unblock peers
    /// that are waiting on this one.
    pub fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }

    fn counts(values: &[usize]) -> Vec<Count> {
        values.iter().map(|v| *v as Count).collect()
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send(&self, peer: usize, tag: Tag, buf: &[f64]) -> HeatResult<()> {
        log::trace!("rank {} -> {}: {} values, tag {}", self.rank(), peer, buf.len(), tag);
        self.world
            .process_at_rank(peer as i32)
            .synchronous_send_with_tag(buf, tag as i32);
        Ok(())
    }

    fn recv(&self, peer: usize, tag: Tag, buf: &mut [f64]) -> HeatResult<()> {
        let status = self
            .world
            .process_at_rank(peer as i32)
            .receive_into_with_tag(buf, tag as i32);
        let received = status.count(f64::equivalent_datatype()) as usize;
        if received != buf.len() {
            return Err(HeatError::communication(
                self.rank(),
                peer,
                format!("expected {} values, received {}", buf.len(), received),
            ));
        }
        Ok(())
    }

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
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() == root {
            let send = send.ok_or_else(|| {
                HeatError::invalid("scatter root has no buffer to send")
            })?;
            let partition =
                Partition::new(send, Self::counts(counts), Self::counts(offsets));
            root_process.scatter_varcount_into_root(&partition, recv);
        } else {
            root_process.scatter_varcount_into(recv);
        }
        Ok(())
    }

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
        let root_process = self.world.process_at_rank(root as i32);
        if self.rank() == root {
            let recv = recv.ok_or_else(|| {
                HeatError::invalid("gather root has no buffer to receive into")
            })?;
            let mut partition = PartitionMut::new(
                recv,
                Self::counts(counts),
                Self::counts(offsets),
            );
            root_process.gather_varcount_into_root(send, &mut partition);
        } else {
            root_process.gather_varcount_into(send);
        }
        Ok(())
    }
}
