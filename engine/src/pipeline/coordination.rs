
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::model::Network;

///
/// A pointer to a checkpoint the learner has written: the global step it
/// was taken at and where it lives on disk.
///
#[derive(Clone, Debug)]
pub struct CheckpointRef
{
    pub train_steps: usize,
    pub path: PathBuf
}

///
/// The shared coordination plane between the learner, the actors and the
/// data collector: a one-shot stop signal, the global training-step
/// counter, a bounded list of recent checkpoint references, and the
/// latest published network snapshot.
///
/// The snapshot is replaced wholesale under a write lock, so actors either
/// see the previous network or the new one, never a half-written mix.
///
pub struct Coordination
{
    stop: AtomicBool,
    train_steps: AtomicUsize,
    checkpoints: Mutex<VecDeque<CheckpointRef>>,
    snapshot: RwLock<Arc<Network>>,
    max_refs: usize
}

impl Coordination
{
    pub fn new (network: Arc<Network>, train_steps: usize, max_refs: usize) -> Coordination
    {
        Coordination
        {
            stop: AtomicBool::new(false),
            train_steps: AtomicUsize::new(train_steps),
            checkpoints: Mutex::new(VecDeque::new()),
            snapshot: RwLock::new(network),
            max_refs: max_refs.max(1)
        }
    }

    ///
    /// Raises the stop signal. The signal is never lowered again.
    ///
    pub fn request_stop (& self)
    {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped (& self) -> bool
    {
        self.stop.load(Ordering::Acquire)
    }

    pub fn train_steps (& self) -> usize
    {
        self.train_steps.load(Ordering::Acquire)
    }

    ///
    /// Advances the global step counter and returns the new count.
    ///
    pub fn increment_train_steps (& self) -> usize
    {
        self.train_steps.fetch_add(1, Ordering::AcqRel) + 1
    }

    ///
    /// Records a fresh checkpoint reference and replaces the published
    /// network snapshot, evicting the oldest reference past the cap.
    ///
    pub fn publish (& self, reference: CheckpointRef, network: Arc<Network>)
    {
        let mut checkpoints = self.checkpoints.lock();

        checkpoints.push_back(reference);
        while checkpoints.len() > self.max_refs
        {
            checkpoints.pop_front();
        }

        * self.snapshot.write() = network;
    }

    ///
    /// The most recently published checkpoint reference, if any.
    ///
    pub fn latest_checkpoint (& self) -> Option<CheckpointRef>
    {
        self.checkpoints.lock().back().cloned()
    }

    ///
    /// The most recently published network.
    ///
    pub fn snapshot (& self) -> Arc<Network>
    {
        self.snapshot.read().clone()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    use std::thread;

    use crate::model::config::Config as ModelConfig;

    fn coordination () -> Coordination
    {
        let config = ModelConfig { num_planes: 8, hidden_size: 4 };
        let network = Arc::new(Network::new(& config, 2, 2, 1));
        Coordination::new(network, 0, 3)
    }

    #[test]
    fn the_step_counter_survives_concurrent_increments ()
    {
        let coordination = Arc::new(coordination());

        let handles : Vec<_> = (0 .. 4)
            .map(|_| {
                let coordination = Arc::clone(& coordination);
                thread::spawn(move || {
                    for _ in 0 .. 1000
                    {
                        coordination.increment_train_steps();
                    }
                })
            })
            .collect();

        for handle in handles
        {
            handle.join().unwrap();
        }

        assert_eq!(coordination.train_steps(), 4000);
    }

    #[test]
    fn the_checkpoint_list_stays_bounded_and_ordered ()
    {
        let coordination = coordination();
        let network = coordination.snapshot();

        for steps in [100, 200, 300, 400, 500]
        {
            let reference = CheckpointRef { train_steps: steps, path: PathBuf::from(format!("ckpt_{}", steps)) };
            coordination.publish(reference, Arc::clone(& network));
        }

        assert_eq!(coordination.checkpoints.lock().len(), 3);
        assert_eq!(coordination.latest_checkpoint().unwrap().train_steps, 500);
        assert_eq!(coordination.checkpoints.lock().front().unwrap().train_steps, 300);
    }

    #[test]
    fn the_stop_signal_is_one_shot_and_visible ()
    {
        let coordination = coordination();

        assert!(! coordination.is_stopped());
        coordination.request_stop();
        coordination.request_stop();
        assert!(coordination.is_stopped());
    }
}
