
use utils::{Serialize, Deserialize};

///
/// A configuration for the predictive model.
///
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config
{
    #[serde(default = "num_planes")]
    pub num_planes: usize,

    #[serde(default = "hidden_size")]
    pub hidden_size: usize
}

impl Default for Config
{
    fn default () -> Config
    {
        Config
        {
            num_planes: num_planes(),
            hidden_size: hidden_size()
        }
    }
}

fn num_planes () -> usize
{
    64
}

fn hidden_size () -> usize
{
    32
}
