
use utils::{Serialize, Deserialize};

///
/// A configuration for the prioritized replay store and its persistence.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config
{
    #[serde(default = "capacity")]
    pub capacity: usize,

    #[serde(default = "priority_exponent")]
    pub priority_exponent: f32,

    #[serde(default = "importance_sampling_exponent")]
    pub importance_sampling_exponent: f32,

    #[serde(default = "samples_save_frequency")]
    pub samples_save_frequency: i64,

    #[serde(default = "samples_save_dir")]
    pub samples_save_dir: String,

    #[serde(default = "load_samples_file")]
    pub load_samples_file: String
}

impl Default for Config
{
    fn default () -> Config
    {
        Config
        {
            capacity: capacity(),
            priority_exponent: priority_exponent(),
            importance_sampling_exponent: importance_sampling_exponent(),
            samples_save_frequency: samples_save_frequency(),
            samples_save_dir: samples_save_dir(),
            load_samples_file: load_samples_file()
        }
    }
}

fn capacity () -> usize
{
    100000
}

fn priority_exponent () -> f32
{
    1.0
}

fn importance_sampling_exponent () -> f32
{
    1.0
}

fn samples_save_frequency () -> i64
{
    -1
}

fn samples_save_dir () -> String
{
    "samples".to_owned()
}

fn load_samples_file () -> String
{
    String::new()
}
