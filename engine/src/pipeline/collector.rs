
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

use parking_lot::Mutex;

use utils::log::{info, warn};
use utils::serialize;

use crate::config::Config;
use crate::replay::{PrioritizedReplay, Trajectory, make_unroll_samples};

///
/// The data collector loop: the single consumer of the trajectory queue.
///
/// Each received episode is sliced into unroll samples and inserted into
/// the replay store with its initial priority. The loop ends once every
/// actor has dropped its sender, which happens after the stop signal.
///
/// When `samples_save_frequency` is positive, the store's state is
/// persisted each time that many lifetime insertions have accumulated. A
/// failed save is logged and skipped; collection itself never stops for
/// one.
///
pub fn run_data_collector (
    config: Arc<Config>,
    receiver: Receiver<Trajectory>,
    replay: Arc<Mutex<PrioritizedReplay>>,
    tag: String
)
{
    let frequency = config.replay.samples_save_frequency;
    let mut next_save = match frequency > 0
    {
        true  => frequency as usize,
        false => usize::MAX
    };

    info!("data collector starting.");

    let mut trajectories = 0_usize;

    while let Ok(trajectory) = receiver.recv()
    {
        if trajectory.is_empty()
        {
            continue;
        }

        trajectories += 1;

        let samples = make_unroll_samples(
            & trajectory,
            config.train.n_step,
            config.train.unroll_steps,
            config.mcts.discount
        );

        let mut store = replay.lock();
        for (sample, priority) in samples
        {
            store.add(sample, priority);
        }

        while store.num_added() >= next_save
        {
            let path = Path::new(& config.replay.samples_save_dir)
                .join(format!("{}_num_added_{}.json", tag, store.num_added()));

            match serialize::save_to_file(& store.get_state(), & path)
            {
                Ok(())   => info!("saved replay samples to '{}'.", path.display()),
                Err(err) => warn!("failed to save replay samples: {:#}.", err)
            }

            next_save += frequency as usize;
        }
    }

    info!("data collector stopping after {} trajectories.", trajectories);
}

#[cfg(test)]
mod tests
{
    use super::*;

    use std::sync::mpsc;

    use crate::replay::Transition;

    fn trajectory (length: usize) -> Trajectory
    {
        let mut trajectory = Trajectory::new();
        for step in 0 .. length
        {
            trajectory.push(Transition
            {
                observation: vec![step as f32, 0.0],
                action: step % 2,
                reward: 1.0,
                visit_distribution: vec![0.5, 0.5],
                root_value: 0.0,
                player: 0
            });
        }
        trajectory
    }

    #[test]
    fn episodes_land_in_the_replay_store ()
    {
        let config = Arc::new(Config::default());
        let replay = Arc::new(Mutex::new(PrioritizedReplay::new(& config.replay, 1)));

        let (sender, receiver) = mpsc::channel();
        sender.send(trajectory(8)).unwrap();
        sender.send(Trajectory::new()).unwrap();
        sender.send(trajectory(3)).unwrap();
        drop(sender);

        run_data_collector(Arc::clone(& config), receiver, Arc::clone(& replay), "test".to_owned());

        // One sample per position; the empty trajectory contributes none.
        assert_eq!(replay.lock().size(), 11);
        assert_eq!(replay.lock().num_added(), 11);
    }

    #[test]
    fn the_store_is_persisted_on_the_configured_cadence ()
    {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.replay.samples_save_frequency = 5;
        config.replay.samples_save_dir = dir.path().to_string_lossy().into_owned();
        let config = Arc::new(config);

        let replay = Arc::new(Mutex::new(PrioritizedReplay::new(& config.replay, 1)));

        let (sender, receiver) = mpsc::channel();
        sender.send(trajectory(6)).unwrap();
        drop(sender);

        run_data_collector(Arc::clone(& config), receiver, replay, "test".to_owned());

        assert!(dir.path().join("test_num_added_6.json").exists());
    }
}
