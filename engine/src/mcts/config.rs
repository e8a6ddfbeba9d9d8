
use utils::{Serialize, Deserialize};

///
/// A configuration object for the tree searcher.
///
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config
{
    #[serde(default = "num_simulations")]
    pub num_simulations: usize,

    #[serde(default = "discount")]
    pub discount: f32,

    #[serde(default = "pb_c_base")]
    pub pb_c_base: f32,

    #[serde(default = "pb_c_init")]
    pub pb_c_init: f32,

    #[serde(default = "root_noise_alpha")]
    pub root_noise_alpha: f32,

    #[serde(default = "root_noise_fraction")]
    pub root_noise_fraction: f32,

    #[serde(default)]
    pub min_bound: Option<f32>,

    #[serde(default)]
    pub max_bound: Option<f32>
}

impl Default for Config
{
    fn default () -> Config
    {
        Config
        {
            num_simulations: num_simulations(),
            discount: discount(),
            pb_c_base: pb_c_base(),
            pb_c_init: pb_c_init(),
            root_noise_alpha: root_noise_alpha(),
            root_noise_fraction: root_noise_fraction(),
            min_bound: None,
            max_bound: None
        }
    }
}

fn num_simulations () -> usize
{
    30
}

fn discount () -> f32
{
    0.997
}

fn pb_c_base () -> f32
{
    19652.0
}

fn pb_c_init () -> f32
{
    1.25
}

fn root_noise_alpha () -> f32
{
    0.25
}

fn root_noise_fraction () -> f32
{
    0.25
}
