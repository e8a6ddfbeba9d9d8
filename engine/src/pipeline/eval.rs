
use std::path::Path;

use utils::error::*;
use utils::log::info;

use crate::config::Config;
use crate::mcts::Searcher;
use crate::model::Checkpoint;

///
/// The outcome of one evaluation episode.
///
#[derive(Clone, Copy, Debug)]
pub struct EvalReport
{
    pub returns: f32,
    pub steps: usize
}

///
/// Plays a single greedy episode with the network from the given
/// checkpoint: most-visited action every step, no exploration noise.
///
pub fn run_evaluation (config: & Config, checkpoint_path: & str) -> Result<EvalReport>
{
    if checkpoint_path.is_empty()
    {
        return Err(error::error!("No checkpoint file was provided for evaluation."));
    }

    let checkpoint = Checkpoint::load(Path::new(checkpoint_path))?;
    let network = checkpoint.network;

    let mut env = gyms::make(& config.env.name, config.env.seed, config.env.stack_history)?;

    if network.observation_dim != env.observation_dim() || network.num_actions != env.num_actions()
    {
        return Err(error::error!(
            "Checkpoint dimensions ({}, {}) do not match environment '{}' ({}, {}).",
            network.observation_dim, network.num_actions,
            config.env.name, env.observation_dim(), env.num_actions()
        ));
    }

    let mut searcher = Searcher::new(config.mcts.clone(), config.env.seed);

    let mut observation = env.reset();
    let mut returns = 0.0;
    let mut steps = 0_usize;

    loop
    {
        let result = searcher.search(
            & network,
            & observation,
            & env.actions_mask(),
            env.current_player(),
            env.opponent_player(),
            0.0,
            true
        );

        let step = env.step(result.action)?;

        returns += step.reward;
        steps += 1;
        observation = step.observation;

        if step.done
        {
            break;
        }
    }

    info!("evaluated '{}' at step {}: returns {}, steps {}.", checkpoint_path, checkpoint.train_steps, returns, steps);

    Ok(EvalReport { returns, steps })
}

#[cfg(test)]
mod tests
{
    use super::*;

    use crate::model::{Adam, MultiStepLR, Network};

    #[test]
    fn evaluation_plays_one_full_episode ()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut config = Config::default();
        config.env.name = "Chain-v0".to_owned();
        config.model.num_planes = 8;
        config.model.hidden_size = 4;
        config.mcts.num_simulations = 4;

        let network = Network::new(& config.model, 2, 2, 9);
        let optimizer = Adam::new(& network, 0.9, 0.999, 1e-8, 1e-4);
        let lr_scheduler = MultiStepLR::new(0.001, 0.1, vec![100]);

        let checkpoint = Checkpoint { network, optimizer, lr_scheduler, train_steps: 42 };
        checkpoint.save(& path).unwrap();

        let report = run_evaluation(& config, & path.to_string_lossy()).unwrap();

        assert_eq!(report.steps, 8);
    }

    #[test]
    fn a_missing_checkpoint_is_an_error ()
    {
        let config = Config::default();

        assert!(run_evaluation(& config, "").is_err());
        assert!(run_evaluation(& config, "nowhere/ckpt.json").is_err());
    }
}
