
use utils::error::*;

///
/// The flat feature vector an environment exposes to the agent.
///
pub type Observation = Vec<f32>;

///
/// The result of advancing an environment by one action.
///
#[derive(Clone, Debug)]
pub struct StepResult
{
    pub observation: Observation,
    pub reward: f32,
    pub done: bool
}

///
/// Errors raised by environment construction and stepping.
///
#[derive(Debug, thiserror::Error)]
pub enum GymError
{
    #[error("No environment is registered under the name '{0}'.")]
    UnknownEnvironment(String),

    #[error("Action {0} is not legal in the current state.")]
    IllegalAction(usize)
}

///
/// A sequential decision environment.
///
/// Environments are driven by exactly one self-play actor at a time and are
/// never shared; everything here takes `& mut self` and implementations are
/// free to keep per-instance random state.
///
/// Single-agent environments report the same identifier for the current and
/// opponent player, which the search engine reads as "players never
/// alternate".
///
pub trait Environment : Send
{
    ///
    /// Resets the environment to a fresh episode and returns the initial
    /// observation.
    ///
    fn reset (& mut self) -> Observation;

    ///
    /// Advances the episode by one action.
    ///
    fn step (& mut self, action: usize) -> Result<StepResult>;

    ///
    /// Returns the legality mask over the full action space.
    ///
    fn actions_mask (& self) -> Vec<bool>;

    ///
    /// The size of the action space.
    ///
    fn num_actions (& self) -> usize;

    ///
    /// The length of the observation vector.
    ///
    fn observation_dim (& self) -> usize;

    ///
    /// The registered name of this environment.
    ///
    fn id (& self) -> String;

    ///
    /// The player whose turn it is.
    ///
    fn current_player (& self) -> usize
    {
        0
    }

    ///
    /// The player waiting to move; equal to the current player outside of
    /// two-player settings.
    ///
    fn opponent_player (& self) -> usize
    {
        0
    }
}
