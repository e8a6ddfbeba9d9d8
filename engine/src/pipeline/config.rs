
use utils::{Serialize, Deserialize};

///
/// A configuration for the environments the self-play actors drive.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvConfig
{
    #[serde(default = "name")]
    pub name: String,

    #[serde(default = "stack_history")]
    pub stack_history: usize,

    #[serde(default = "seed")]
    pub seed: u64,

    #[serde(default = "num_actors")]
    pub num_actors: usize
}

impl Default for EnvConfig
{
    fn default () -> EnvConfig
    {
        EnvConfig
        {
            name: name(),
            stack_history: stack_history(),
            seed: seed(),
            num_actors: num_actors()
        }
    }
}

fn name () -> String
{
    "CartPole-v1".to_owned()
}

fn stack_history () -> usize
{
    1
}

fn seed () -> u64
{
    1
}

fn num_actors () -> usize
{
    6
}

///
/// A configuration for the learner loop, its optimizer and its
/// checkpointing cadence.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainConfig
{
    #[serde(default = "learning_rate")]
    pub learning_rate: f32,

    #[serde(default = "learning_rate_decay")]
    pub learning_rate_decay: f32,

    #[serde(default = "lr_boundaries")]
    pub lr_boundaries: Vec<usize>,

    #[serde(default = "l2_decay")]
    pub l2_decay: f32,

    #[serde(default = "clip_grad")]
    pub clip_grad: bool,

    #[serde(default = "max_grad_norm")]
    pub max_grad_norm: f32,

    #[serde(default = "n_step")]
    pub n_step: usize,

    #[serde(default = "unroll_steps")]
    pub unroll_steps: usize,

    #[serde(default = "batch_size")]
    pub batch_size: usize,

    #[serde(default = "min_replay_size")]
    pub min_replay_size: usize,

    #[serde(default = "num_train_steps")]
    pub num_train_steps: usize,

    #[serde(default = "train_delay_ms")]
    pub train_delay_ms: u64,

    #[serde(default = "checkpoint_frequency")]
    pub checkpoint_frequency: usize,

    #[serde(default = "checkpoint_dir")]
    pub checkpoint_dir: String,

    #[serde(default = "load_checkpoint_file")]
    pub load_checkpoint_file: String,

    #[serde(default = "max_checkpoint_refs")]
    pub max_checkpoint_refs: usize,

    #[serde(default = "refresh_interval")]
    pub refresh_interval: usize
}

impl Default for TrainConfig
{
    fn default () -> TrainConfig
    {
        TrainConfig
        {
            learning_rate: learning_rate(),
            learning_rate_decay: learning_rate_decay(),
            lr_boundaries: lr_boundaries(),
            l2_decay: l2_decay(),
            clip_grad: clip_grad(),
            max_grad_norm: max_grad_norm(),
            n_step: n_step(),
            unroll_steps: unroll_steps(),
            batch_size: batch_size(),
            min_replay_size: min_replay_size(),
            num_train_steps: num_train_steps(),
            train_delay_ms: train_delay_ms(),
            checkpoint_frequency: checkpoint_frequency(),
            checkpoint_dir: checkpoint_dir(),
            load_checkpoint_file: load_checkpoint_file(),
            max_checkpoint_refs: max_checkpoint_refs(),
            refresh_interval: refresh_interval()
        }
    }
}

fn learning_rate () -> f32
{
    0.0005
}

fn learning_rate_decay () -> f32
{
    0.1
}

fn lr_boundaries () -> Vec<usize>
{
    vec![500000]
}

fn l2_decay () -> f32
{
    0.0001
}

fn clip_grad () -> bool
{
    false
}

fn max_grad_norm () -> f32
{
    40.0
}

fn n_step () -> usize
{
    10
}

fn unroll_steps () -> usize
{
    5
}

fn batch_size () -> usize
{
    128
}

fn min_replay_size () -> usize
{
    10000
}

fn num_train_steps () -> usize
{
    500000
}

fn train_delay_ms () -> u64
{
    0
}

fn checkpoint_frequency () -> usize
{
    1000
}

fn checkpoint_dir () -> String
{
    "checkpoints".to_owned()
}

fn load_checkpoint_file () -> String
{
    String::new()
}

fn max_checkpoint_refs () -> usize
{
    10
}

fn refresh_interval () -> usize
{
    100
}
