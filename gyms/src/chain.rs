
use utils::error::*;

use super::env::*;

///
/// A fully deterministic two-state chain used to exercise the search and
/// training plumbing. Action 1 toggles the state, action 0 keeps it; a
/// reward of one is paid whenever the agent is in the second state. The
/// episode ends after a fixed horizon.
///
/// Every transition is a pure function of (state, action), which makes
/// seeded searches over this environment exactly reproducible.
///
pub struct Chain
{
    state: usize,
    steps: usize,
    horizon: usize,
    done: bool
}

impl Chain
{
    pub fn new (horizon: usize) -> Chain
    {
        Chain { state: 0, steps: 0, horizon, done: true }
    }

    fn observe (& self) -> Observation
    {
        match self.state
        {
            0 => vec![1.0, 0.0],
            _ => vec![0.0, 1.0]
        }
    }
}

impl Environment for Chain
{
    fn reset (& mut self) -> Observation
    {
        self.state = 0;
        self.steps = 0;
        self.done = false;

        self.observe()
    }

    fn step (& mut self, action: usize) -> Result<StepResult>
    {
        if action >= 2 || self.done
        {
            return Err(GymError::IllegalAction(action).into());
        }

        if action == 1
        {
            self.state = 1 - self.state;
        }

        self.steps += 1;
        self.done = self.steps >= self.horizon;

        let reward = self.state as f32;
        Ok(StepResult { observation: self.observe(), reward, done: self.done })
    }

    fn actions_mask (& self) -> Vec<bool>
    {
        vec![true; 2]
    }

    fn num_actions (& self) -> usize
    {
        2
    }

    fn observation_dim (& self) -> usize
    {
        2
    }

    fn id (& self) -> String
    {
        "Chain-v0".to_owned()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn toggling_collects_reward_each_step ()
    {
        let mut env = Chain::new(4);
        assert_eq!(env.reset(), vec![1.0, 0.0]);

        let result = env.step(1).unwrap();
        assert_eq!(result.reward, 1.0);
        assert_eq!(result.observation, vec![0.0, 1.0]);

        let result = env.step(0).unwrap();
        assert_eq!(result.reward, 1.0);

        env.step(1).unwrap();
        let result = env.step(0).unwrap();
        assert!(result.done);
    }
}
