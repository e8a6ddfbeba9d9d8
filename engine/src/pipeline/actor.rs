
use std::sync::Arc;
use std::sync::mpsc::Sender;

use gyms::Environment;

use utils::log::{debug, info, warn};

use crate::config::Config;
use crate::mcts::Searcher;
use crate::replay::{Trajectory, Transition};

use super::coordination::Coordination;

///
/// The self-play temperature schedule: exploratory early in training,
/// sharpening as the model improves.
///
pub fn visit_softmax_temperature (train_steps: usize) -> f32
{
    match train_steps
    {
        s if s < 10_000 => 1.0,
        s if s < 30_000 => 0.5,
        _               => 0.25
    }
}

///
/// The self-play actor loop: plays full episodes against its own
/// environment with the latest published network, and ships each completed
/// trajectory to the data collector.
///
/// The model is refreshed amortized, every `refresh_interval` environment
/// steps and only when a newer checkpoint has been published. On stop, a
/// partial episode is discarded rather than sent, so the collector only
/// ever sees episodes with terminal targets.
///
pub fn run_self_play (
    id: usize,
    config: Arc<Config>,
    mut env: Box<dyn Environment>,
    coordination: Arc<Coordination>,
    sender: Sender<Trajectory>
)
{
    let seed = config.env.seed + (id * id) as u64;
    let mut searcher = Searcher::new(config.mcts.clone(), seed);

    let mut model = coordination.snapshot();
    let mut model_steps = coordination.latest_checkpoint().map_or(0, |r| r.train_steps);

    let mut episodes = 0_usize;
    let mut env_steps = 0_usize;

    info!("actor {} starting on '{}'.", id, env.id());

    'actor: while ! coordination.is_stopped()
    {
        let mut observation = env.reset();
        let mut trajectory = Trajectory::new();

        loop
        {
            if coordination.is_stopped()
            {
                // A partial episode has no terminal targets; drop it.
                break 'actor;
            }

            if config.train.refresh_interval > 0 && env_steps % config.train.refresh_interval == 0
            {
                if let Some(reference) = coordination.latest_checkpoint()
                {
                    if reference.train_steps > model_steps
                    {
                        model = coordination.snapshot();
                        model_steps = reference.train_steps;
                        debug!("actor {} refreshed to the network at step {}.", id, model_steps);
                    }
                }
            }

            let temperature = visit_softmax_temperature(coordination.train_steps());
            let mask = env.actions_mask();
            let player = env.current_player();

            let result = searcher.search(
                & model,
                & observation,
                & mask,
                player,
                env.opponent_player(),
                temperature,
                false
            );

            let step = match env.step(result.action)
            {
                Ok(step) => step,
                Err(err) =>
                {
                    warn!("actor {} aborting episode: {:#}.", id, err);
                    break;
                }
            };

            trajectory.push(Transition
            {
                observation,
                action: result.action,
                reward: step.reward,
                visit_distribution: result.visit_distribution,
                root_value: result.root_value,
                player
            });

            observation = step.observation;
            env_steps += 1;

            if step.done
            {
                episodes += 1;

                // The receiving side is gone once the collector exits.
                if sender.send(trajectory).is_err()
                {
                    break 'actor;
                }

                break;
            }
        }
    }

    info!("actor {} stopping after {} episodes ({} environment steps).", id, episodes, env_steps);
}
