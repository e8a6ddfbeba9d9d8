
pub mod actor;
pub mod collector;
pub mod config;
pub mod coordination;
pub mod eval;
pub mod learner;

pub use coordination::{CheckpointRef, Coordination};
pub use eval::{EvalReport, run_evaluation};

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use parking_lot::Mutex;

use utils::error::*;
use utils::log::{info, warn};
use utils::serialize;

use crate::config::Config;
use crate::model::{Adam, Checkpoint, MultiStepLR, Network};
use crate::replay::{PrioritizedReplay, ReplayState};

///
/// Runs the full training pipeline to completion: one learner thread, one
/// data collector thread, and `num_actors` self-play actor threads, all
/// sharing a coordination plane and a replay store.
///
/// Shutdown is driven entirely by the stop signal: the learner raises it
/// when it finishes (or fails), the actors drop their trajectory senders
/// in response, and the collector exits once the queue disconnects.
///
pub fn run_train (config: Config) -> Result<()>
{
    let tag = config.run_tag();
    let config = Arc::new(config);

    // One throwaway instance fixes the model dimensions for this run.

    let probe = gyms::make(& config.env.name, config.env.seed, config.env.stack_history)?;
    let observation_dim = probe.observation_dim();
    let num_actions = probe.num_actions();
    drop(probe);

    let mut network = Network::new(& config.model, observation_dim, num_actions, config.env.seed);
    let mut optimizer = Adam::new(& network, 0.9, 0.999, 1e-8, config.train.l2_decay);
    let mut lr_scheduler = MultiStepLR::new(
        config.train.learning_rate,
        config.train.learning_rate_decay,
        config.train.lr_boundaries.clone()
    );
    let mut start_steps = 0_usize;

    if ! config.train.load_checkpoint_file.is_empty()
    {
        match Checkpoint::load(Path::new(& config.train.load_checkpoint_file))
        {
            Ok(checkpoint) =>
            {
                network = checkpoint.network;
                optimizer = checkpoint.optimizer;
                lr_scheduler = checkpoint.lr_scheduler;
                start_steps = checkpoint.train_steps;

                info!("resumed from '{}' at step {}.", & config.train.load_checkpoint_file, start_steps);
            },
            Err(err) => warn!("starting fresh; could not load a checkpoint: {:#}.", err)
        }
    }

    if network.observation_dim != observation_dim || network.num_actions != num_actions
    {
        return Err(error::error!(
            "Checkpoint dimensions ({}, {}) do not match environment '{}' ({}, {}).",
            network.observation_dim, network.num_actions,
            config.env.name, observation_dim, num_actions
        ));
    }

    let replay = Arc::new(Mutex::new(PrioritizedReplay::new(& config.replay, config.env.seed)));

    if ! config.replay.load_samples_file.is_empty()
    {
        match serialize::load_from_file::<ReplayState>(Path::new(& config.replay.load_samples_file))
        {
            Ok(state) =>
            {
                let mut store = replay.lock();
                store.set_state(state);
                info!("loaded {} replay samples from '{}'.", store.size(), & config.replay.load_samples_file);
            },
            Err(err) => warn!("starting with an empty replay store: {:#}.", err)
        }
    }

    let coordination = Arc::new(Coordination::new(
        Arc::new(network.clone()),
        start_steps,
        config.train.max_checkpoint_refs
    ));

    let (sender, receiver) = mpsc::channel();

    let collector =
    {
        let config = Arc::clone(& config);
        let replay = Arc::clone(& replay);
        let tag = tag.clone();

        thread::Builder::new()
            .name("collector".to_owned())
            .spawn(move || collector::run_data_collector(config, receiver, replay, tag))?
    };

    let learner =
    {
        let config = Arc::clone(& config);
        let replay = Arc::clone(& replay);
        let coordination = Arc::clone(& coordination);
        let tag = tag.clone();

        thread::Builder::new()
            .name("learner".to_owned())
            .spawn(move || learner::run_training(config, network, optimizer, lr_scheduler, replay, coordination, tag))?
    };

    let mut actors = Vec::with_capacity(config.env.num_actors);
    for id in 0 .. config.env.num_actors
    {
        let env = gyms::make(
            & config.env.name,
            config.env.seed + (id * id) as u64,
            config.env.stack_history
        )?;

        let config = Arc::clone(& config);
        let coordination = Arc::clone(& coordination);
        let sender = sender.clone();

        let handle = thread::Builder::new()
            .name(format!("actor-{}", id))
            .spawn(move || actor::run_self_play(id, config, env, coordination, sender))?;

        actors.push(handle);
    }

    // The collector must only see the actors' senders, so the queue
    // disconnects exactly when the last actor exits.
    drop(sender);

    for (id, handle) in actors.into_iter().enumerate()
    {
        if handle.join().is_err()
        {
            warn!("actor {} panicked.", id);
        }
    }

    let result = learner.join().map_err(|_| error::error!("The learner thread panicked."))?;

    if collector.join().is_err()
    {
        warn!("the data collector panicked.");
    }

    info!("training run '{}' complete at step {}.", tag, coordination.train_steps());

    result
}
