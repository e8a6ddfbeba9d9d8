
use std::path::Path;

use utils::error::*;
use utils::serialize;
use utils::{Serialize, Deserialize};

use super::network::Network;
use super::optim::{Adam, MultiStepLR};

///
/// An immutable snapshot of everything a training run needs to resume:
/// the network parameters, the optimizer moments, the learning-rate
/// schedule position and the global step count at save time.
///
/// Actors and evaluation load only the network out of it.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint
{
    pub network: Network,
    pub optimizer: Adam,
    pub lr_scheduler: MultiStepLR,
    pub train_steps: usize
}

impl Checkpoint
{
    ///
    /// Writes this checkpoint to the given path.
    ///
    pub fn save (& self, path: & Path) -> Result<()>
    {
        serialize::save_to_file(self, path)
            .context(format!("Failed to save checkpoint to '{}'.", path.display()))
    }

    ///
    /// Reads a checkpoint back from the given path.
    ///
    pub fn load (path: & Path) -> Result<Checkpoint>
    {
        serialize::load_from_file(path)
            .context(format!("Failed to load checkpoint from '{}'.", path.display()))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::config::Config as ModelConfig;

    #[test]
    fn checkpoints_round_trip_bit_identically ()
    {
        let config = ModelConfig { num_planes: 8, hidden_size: 4 };
        let network = Network::new(& config, 3, 2, 5);
        let optimizer = Adam::new(& network, 0.9, 0.999, 1e-8, 1e-4);
        let mut lr_scheduler = MultiStepLR::new(0.001, 0.1, vec![100]);
        lr_scheduler.step();

        let checkpoint = Checkpoint { network, optimizer, lr_scheduler, train_steps: 1234 };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");

        checkpoint.save(& path).unwrap();
        let loaded = Checkpoint::load(& path).unwrap();

        assert_eq!(checkpoint, loaded);
        assert_eq!(loaded.train_steps, 1234);
    }

    #[test]
    fn loading_a_missing_checkpoint_fails_cleanly ()
    {
        assert!(Checkpoint::load(Path::new("nowhere/ckpt.json")).is_err());
    }
}
