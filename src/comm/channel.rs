use super::*;
use crossbeam_channel::{bounded, Receiver, Sender};

#[derive(Debug)]
struct Message {
    tag: Tag,
    data: Vec<f64>,
}

/// In-process communicator, one per worker thread.
///
/// Each ordered pair of workers gets its own zero-capacity channel, so a
/// send only completes once the peer is inside the matching receive.
/// Dropping a `ChannelComm` disconnects all of its channels, which turns
/// any peer still waiting on it into a `CommunicationFailure`.
#[derive(Debug)]
pub struct ChannelComm {
    rank: usize,
    senders: Vec<Option<Sender<Message>>>,
    receivers: Vec<Option<Receiver<Message>>>,
}

impl ChannelComm {
    /// Build a fully connected set of `size` communicators, indexed by rank.
    pub fn world(size: usize) -> Vec<ChannelComm> {
        let mut comms: Vec<ChannelComm> = (0..size)
            .map(|rank| ChannelComm {
                rank,
                senders: (0..size).map(|_| None).collect(),
                receivers: (0..size).map(|_| None).collect(),
            })
            .collect();

        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (tx, rx) = bounded(0);
                comms[from].senders[to] = Some(tx);
                comms[to].receivers[from] = Some(rx);
            }
        }
        comms
    }

    fn sender(&self, peer: usize) -> HeatResult<&Sender<Message>> {
        self.senders
            .get(peer)
            .and_then(Option::as_ref)
            .ok_or_else(|| HeatError::communication(self.rank, peer, "no channel to peer"))
    }

    fn receiver(&self, peer: usize) -> HeatResult<&Receiver<Message>> {
        self.receivers
            .get(peer)
            .and_then(Option::as_ref)
            .ok_or_else(|| HeatError::communication(self.rank, peer, "no channel from peer"))
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn send(&self, peer: usize, tag: Tag, buf: &[f64]) -> HeatResult<()> {
        log::trace!("worker {} -> {}: {} values, tag {}", self.rank, peer, buf.len(), tag);
        let message = Message {
            tag,
            data: buf.to_vec(),
        };
        self.sender(peer)?
            .send(message)
            .map_err(|_| HeatError::communication(self.rank, peer, "peer disconnected during send"))
    }

    fn recv(&self, peer: usize, tag: Tag, buf: &mut [f64]) -> HeatResult<()> {
        let message = self
            .receiver(peer)?
            .recv()
            .map_err(|_| HeatError::communication(self.rank, peer, "peer disconnected during receive"))?;
        if message.tag != tag {
            return Err(HeatError::communication(
                self.rank,
                peer,
                format!("expected tag {}, received tag {}", tag, message.tag),
            ));
        }
        if message.data.len() != buf.len() {
            return Err(HeatError::communication(
                self.rank,
                peer,
                format!(
                    "expected {} values, received {}",
                    buf.len(),
                    message.data.len()
                ),
            ));
        }
        buf.copy_from_slice(&message.data);
        log::trace!("worker {} <- {}: {} values, tag {}", self.rank, peer, buf.len(), tag);
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::thread;

    #[test]
    fn roundtrip_two_workers() {
        let mut world = ChannelComm::world(2);
        let comm1 = world.pop().unwrap();
        let comm0 = world.pop().unwrap();

        thread::scope(|s| {
            s.spawn(move || {
                comm0.send(1, 7, &[1.0, 2.0, 3.0, 4.0]).unwrap();
            });
            let mut recv = [0.0; 4];
            comm1.recv(0, 7, &mut recv).unwrap();
            assert_eq!(recv, [1.0, 2.0, 3.0, 4.0]);
        });
    }

    #[test]
    fn tag_mismatch_test() {
        let mut world = ChannelComm::world(2);
        let comm1 = world.pop().unwrap();
        let comm0 = world.pop().unwrap();

        thread::scope(|s| {
            s.spawn(move || {
                let _ = comm0.send(1, 3, &[1.0]);
            });
            let mut recv = [0.0; 1];
            let r = comm1.recv(0, 4, &mut recv);
            assert!(matches!(
                r,
                Err(HeatError::CommunicationFailure { worker: 1, peer: 0, .. })
            ));
        });
    }

    #[test]
    fn length_mismatch_test() {
        let mut world = ChannelComm::world(2);
        let comm1 = world.pop().unwrap();
        let comm0 = world.pop().unwrap();

        thread::scope(|s| {
            s.spawn(move || {
                let _ = comm0.send(1, HALO_TAG, &[1.0, 2.0]);
            });
            let mut recv = [0.0; 3];
            assert!(comm1.recv(0, HALO_TAG, &mut recv).is_err());
        });
    }

    #[test]
    fn disconnect_test() {
        let mut world = ChannelComm::world(2);
        let comm1 = world.pop().unwrap();
        drop(world);

        let mut recv = [0.0; 1];
        assert!(comm1.recv(0, HALO_TAG, &mut recv).is_err());
        assert!(comm1.send(0, HALO_TAG, &recv).is_err());
    }

    #[test]
    fn self_and_missing_peer_test() {
        let world = ChannelComm::world(2);
        assert!(world[0].send(0, HALO_TAG, &[1.0]).is_err());
        assert!(world[0].send(5, HALO_TAG, &[1.0]).is_err());
        assert_eq!(world[1].size(), 2);
        assert_eq!(world[1].rank(), 1);
    }

    #[test]
    fn scatter_gather_test() {
        let size = 3;
        let counts = [2, 2, 3];
        let offsets = [0, 2, 4];
        let data: Vec<f64> = (0..7).map(|i| i as f64).collect();

        let world = ChannelComm::world(size);
        let gathered = thread::scope(|s| {
            let handles: Vec<_> = world
                .into_iter()
                .map(|comm| {
                    let data = &data;
                    s.spawn(move || {
                        let rank = comm.rank();
                        let mut local = vec![0.0; counts[rank]];
                        let send = (rank == 0).then_some(data.as_slice());
                        comm.scatter_varcount(0, send, &counts, &offsets, &mut local)
                            .unwrap();
                        assert_eq!(
                            local,
                            data[offsets[rank]..offsets[rank] + counts[rank]]
                        );

                        for v in local.iter_mut() {
                            *v *= 2.0;
                        }
                        let mut out = vec![0.0; 7];
                        let recv = (rank == 0).then_some(out.as_mut_slice());
                        comm.gather_varcount(0, &local, &counts, &offsets, recv)
                            .unwrap();
                        out
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });

        let expected: Vec<f64> = data.iter().map(|v| v * 2.0).collect();
        assert_eq!(gathered[0], expected);
    }

    #[test]
    fn scatter_layout_test() {
        let world = ChannelComm::world(1);
        let mut local = vec![0.0; 2];
        let r = world[0].scatter_varcount(0, Some(&[1.0, 2.0]), &[2, 1], &[0, 2], &mut local);
        assert!(matches!(r, Err(HeatError::InvalidConfiguration(_))));
        let r = world[0].scatter_varcount(0, None, &[2], &[0], &mut local);
        assert!(r.is_err());
        world[0]
            .scatter_varcount(0, Some(&[1.0, 2.0]), &[2], &[0], &mut local)
            .unwrap();
        assert_eq!(local, vec![1.0, 2.0]);
    }
}
