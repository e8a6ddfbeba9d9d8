
use utils::{Serialize, Deserialize};

pub use crate::mcts::config::Config as MCTSConfig;
pub use crate::model::config::Config as ModelConfig;
pub use crate::replay::config::Config as ReplayConfig;
pub use crate::pipeline::config::{EnvConfig, TrainConfig};

///
/// Represents a full configuration.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config
{
    #[serde(default)]
    pub env: EnvConfig,

    #[serde(default)]
    pub mcts: MCTSConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub replay: ReplayConfig,

    #[serde(default)]
    pub train: TrainConfig,

    #[serde(default = "log_path")]
    pub log_path: String,

    #[serde(default)]
    pub tag: String
}

impl Default for Config
{
    fn default () -> Config
    {
        Config
        {
            env: EnvConfig::default(),
            mcts: MCTSConfig::default(),
            model: ModelConfig::default(),
            replay: ReplayConfig::default(),
            train: TrainConfig::default(),
            log_path: log_path(),
            tag: String::new()
        }
    }
}

impl Config
{
    ///
    /// The prefix used for every artifact this run writes: the environment
    /// name, with the user tag appended when one is set.
    ///
    pub fn run_tag (& self) -> String
    {
        match self.tag.is_empty()
        {
            true  => self.env.name.clone(),
            false => format!("{}_{}", self.env.name, self.tag)
        }
    }
}

///
/// Returns the default log path.
///
fn log_path () -> String
{
    "logs".to_owned()
}
