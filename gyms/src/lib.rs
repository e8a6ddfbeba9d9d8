
pub mod cartpole;
pub mod chain;
pub mod env;
pub mod stack;

pub use cartpole::CartPole;
pub use chain::Chain;
pub use env::{Environment, GymError, Observation, StepResult};
pub use stack::FrameStack;

use utils::error::*;

///
/// Builds the environment with the given registered name, wrapping it in a
/// frame stacker when a history depth greater than one is requested.
///
pub fn make (name: & str, seed: u64, stack_history: usize) -> Result<Box<dyn Environment>>
{
    let env : Box<dyn Environment> = match name
    {
        "CartPole-v1" => Box::new(CartPole::new(seed, 500)),
        "CartPole-v0" => Box::new(CartPole::new(seed, 200)),
        "Chain-v0"    => Box::new(Chain::new(8)),
        _             => return Err(GymError::UnknownEnvironment(name.to_owned()).into())
    };

    match stack_history > 1
    {
        true  => Ok(Box::new(FrameStack::new(env, stack_history))),
        false => Ok(env)
    }
}
