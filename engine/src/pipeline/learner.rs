
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use utils::error::*;
use utils::log::info;

use crate::config::Config;
use crate::model::{Adam, Checkpoint, MultiStepLR, Network};
use crate::replay::PrioritizedReplay;

use super::coordination::{CheckpointRef, Coordination};

const REPLAY_POLL : Duration = Duration::from_millis(10);

///
/// The learner loop: waits for the replay store to warm up, then runs
/// gradient steps until the configured step count is reached or a stop is
/// requested. The stop signal is raised on the way out regardless of how
/// the loop ended, so the actors and the collector always wind down.
///
pub fn run_training (
    config: Arc<Config>,
    network: Network,
    optimizer: Adam,
    lr_scheduler: MultiStepLR,
    replay: Arc<Mutex<PrioritizedReplay>>,
    coordination: Arc<Coordination>,
    tag: String
) -> Result<()>
{
    let result = train_loop(& config, network, optimizer, lr_scheduler, & replay, & coordination, & tag);
    coordination.request_stop();
    result
}

fn train_loop (
    config: & Config,
    mut network: Network,
    mut optimizer: Adam,
    mut lr_scheduler: MultiStepLR,
    replay: & Mutex<PrioritizedReplay>,
    coordination: & Coordination,
    tag: & str
) -> Result<()>
{
    let train = & config.train;

    info!("learner waiting for {} replay samples.", train.min_replay_size);

    while replay.lock().size() < train.min_replay_size
    {
        if coordination.is_stopped()
        {
            return Ok(());
        }

        thread::sleep(REPLAY_POLL);
    }

    info!("learner starting at step {}.", coordination.train_steps());

    while coordination.train_steps() < train.num_train_steps && ! coordination.is_stopped()
    {
        let (indices, samples, weights) = replay.lock().sample(train.batch_size);
        if samples.is_empty()
        {
            thread::sleep(REPLAY_POLL);
            continue;
        }

        let mut grads = network.zero_gradients();
        let mut priorities = Vec::with_capacity(samples.len());
        let mut total_loss = 0.0;

        for (sample, & weight) in samples.iter().zip(& weights)
        {
            let loss = network.unroll_loss(
                & sample.observation,
                & sample.actions,
                & sample.target_values,
                & sample.target_rewards,
                & sample.target_policies,
                weight,
                & mut grads
            );

            total_loss += loss.total;
            priorities.push(loss.value_error.max(1e-3));
        }

        grads.scale(1.0 / samples.len() as f32);
        if train.clip_grad
        {
            grads.clip_global_norm(train.max_grad_norm);
        }

        optimizer.step(& mut network, & grads, lr_scheduler.rate());
        lr_scheduler.step();

        let steps = coordination.increment_train_steps();

        // The freshly computed value errors become the new priorities of
        // the slots this batch was drawn from.
        replay.lock().update_priorities(& indices, & priorities);

        // A zero cadence disables periodic checkpoints; the final one
        // below is still written.
        if train.checkpoint_frequency > 0 && steps % train.checkpoint_frequency == 0
        {
            publish_checkpoint(config, & network, & optimizer, & lr_scheduler, steps, coordination, tag)?;
            info!("step {}: loss {:.4}, lr {:.6}.", steps, total_loss / samples.len() as f32, lr_scheduler.rate());
        }

        if train.train_delay_ms > 0
        {
            thread::sleep(Duration::from_millis(train.train_delay_ms));
        }
    }

    let steps = coordination.train_steps();
    publish_checkpoint(config, & network, & optimizer, & lr_scheduler, steps, coordination, tag)?;

    info!("learner finished at step {}.", steps);

    Ok(())
}

///
/// Writes a checkpoint to disk and announces it on the coordination
/// plane, making the new network visible to the actors.
///
fn publish_checkpoint (
    config: & Config,
    network: & Network,
    optimizer: & Adam,
    lr_scheduler: & MultiStepLR,
    steps: usize,
    coordination: & Coordination,
    tag: & str
) -> Result<()>
{
    let path = Path::new(& config.train.checkpoint_dir)
        .join(format!("{}_train_steps_{}.json", tag, steps));

    let checkpoint = Checkpoint
    {
        network: network.clone(),
        optimizer: optimizer.clone(),
        lr_scheduler: lr_scheduler.clone(),
        train_steps: steps
    };
    checkpoint.save(& path)?;

    coordination.publish(
        CheckpointRef { train_steps: steps, path },
        Arc::new(network.clone())
    );

    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    use crate::replay::{Trajectory, Transition, make_unroll_samples};

    fn filled_replay (config: & Config, observations: usize) -> PrioritizedReplay
    {
        let mut trajectory = Trajectory::new();
        for step in 0 .. observations
        {
            trajectory.push(Transition
            {
                observation: vec![step as f32 / observations as f32, 0.5],
                action: step % 2,
                reward: 1.0,
                visit_distribution: vec![0.6, 0.4],
                root_value: 0.2,
                player: 0
            });
        }

        let mut replay = PrioritizedReplay::new(& config.replay, 3);
        for (sample, priority) in make_unroll_samples(& trajectory, config.train.n_step, config.train.unroll_steps, config.mcts.discount)
        {
            replay.add(sample, priority);
        }

        replay
    }

    fn tiny_config (checkpoint_dir: & str) -> Config
    {
        let mut config = Config::default();

        config.model.num_planes = 8;
        config.model.hidden_size = 4;
        config.train.batch_size = 4;
        config.train.min_replay_size = 4;
        config.train.num_train_steps = 3;
        config.train.checkpoint_frequency = 2;
        config.train.checkpoint_dir = checkpoint_dir.to_owned();

        config
    }

    #[test]
    fn training_runs_to_the_step_limit_and_stops_the_run ()
    {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(tiny_config(& dir.path().to_string_lossy()));

        let network = Network::new(& config.model, 2, 2, 11);
        let optimizer = Adam::new(& network, 0.9, 0.999, 1e-8, config.train.l2_decay);
        let lr_scheduler = MultiStepLR::new(config.train.learning_rate, config.train.learning_rate_decay, config.train.lr_boundaries.clone());

        let replay = Arc::new(Mutex::new(filled_replay(& config, 12)));
        let coordination = Arc::new(Coordination::new(Arc::new(network.clone()), 0, 4));

        let result = run_training(
            Arc::clone(& config),
            network,
            optimizer,
            lr_scheduler,
            Arc::clone(& replay),
            Arc::clone(& coordination),
            "test".to_owned()
        );

        assert!(result.is_ok());
        assert!(coordination.is_stopped());
        assert_eq!(coordination.train_steps(), 3);

        // The periodic checkpoint at step 2 and the final one at step 3.
        assert!(dir.path().join("test_train_steps_2.json").exists());
        assert!(dir.path().join("test_train_steps_3.json").exists());
        assert_eq!(coordination.latest_checkpoint().unwrap().train_steps, 3);
    }

    #[test]
    fn a_zero_checkpoint_cadence_still_writes_the_final_checkpoint ()
    {
        let dir = tempfile::tempdir().unwrap();
        let mut config = tiny_config(& dir.path().to_string_lossy());
        config.train.checkpoint_frequency = 0;
        let config = Arc::new(config);

        let network = Network::new(& config.model, 2, 2, 11);
        let optimizer = Adam::new(& network, 0.9, 0.999, 1e-8, config.train.l2_decay);
        let lr_scheduler = MultiStepLR::new(config.train.learning_rate, config.train.learning_rate_decay, config.train.lr_boundaries.clone());

        let replay = Arc::new(Mutex::new(filled_replay(& config, 12)));
        let coordination = Arc::new(Coordination::new(Arc::new(network.clone()), 0, 4));

        let result = run_training(
            Arc::clone(& config),
            network,
            optimizer,
            lr_scheduler,
            Arc::clone(& replay),
            Arc::clone(& coordination),
            "test".to_owned()
        );

        assert!(result.is_ok());
        assert_eq!(coordination.train_steps(), 3);

        assert!(! dir.path().join("test_train_steps_2.json").exists());
        assert!(dir.path().join("test_train_steps_3.json").exists());
    }

    #[test]
    fn an_early_stop_wins_over_the_warmup_wait ()
    {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(tiny_config(& dir.path().to_string_lossy()));

        let network = Network::new(& config.model, 2, 2, 11);
        let optimizer = Adam::new(& network, 0.9, 0.999, 1e-8, config.train.l2_decay);
        let lr_scheduler = MultiStepLR::new(config.train.learning_rate, config.train.learning_rate_decay, config.train.lr_boundaries.clone());

        let replay = Arc::new(Mutex::new(PrioritizedReplay::new(& config.replay, 3)));
        let coordination = Arc::new(Coordination::new(Arc::new(network.clone()), 0, 4));
        coordination.request_stop();

        let result = run_training(
            Arc::clone(& config),
            network,
            optimizer,
            lr_scheduler,
            replay,
            Arc::clone(& coordination),
            "test".to_owned()
        );

        assert!(result.is_ok());
        assert_eq!(coordination.train_steps(), 0);
    }
}
