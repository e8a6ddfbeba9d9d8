
use std::fs::OpenOptions;
use std::io::Read;

use clap::Parser;

use engine::config::Config;
use engine::pipeline;

use utils::*;

///
/// A structure representing command line arguments.
///
#[derive(Parser)]
struct CLIArgs
{
    #[clap(short, long, default_value = "train")]
    mode: String,

    #[clap(short, long, default_value = "config/config.toml")]
    config: String,

    /// Checkpoint file to evaluate; falls back to the configured
    /// load_checkpoint_file when omitted.
    #[clap(long)]
    checkpoint: Option<String>
}

fn main () -> Result<()>
{
    let args = CLIArgs::parse();

    let mut config_str = String::new();
    OpenOptions::new().read(true).open(& args.config)?.read_to_string(& mut config_str)?;
    let config : Config = toml::from_str(& config_str)?;

    let _logger = log::initialize(& config.log_path, "engine");

    match args.mode.as_str()
    {
        "train" =>
        {
            pipeline::run_train(config)?;
        },

        "eval" =>
        {
            let checkpoint = args.checkpoint.unwrap_or_else(|| config.train.load_checkpoint_file.clone());
            let report = pipeline::run_evaluation(& config, checkpoint.as_ref())?;
            println!("episode returns: {}, steps: {}", report.returns, report.steps);
        },

        _ =>
        {
            return Err(error::error!("Mode '{}' is unsupported.", & args.mode));
        }
    };

    Ok(())
}
