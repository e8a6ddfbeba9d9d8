
use std::collections::VecDeque;

use utils::error::*;

use super::env::*;

///
/// Wraps an environment so that observations are the concatenation of the
/// most recent `depth` frames, oldest first. On reset the stack is filled
/// with copies of the initial frame.
///
pub struct FrameStack
{
    inner: Box<dyn Environment>,
    depth: usize,
    frames: VecDeque<Observation>
}

impl FrameStack
{
    pub fn new (inner: Box<dyn Environment>, depth: usize) -> FrameStack
    {
        FrameStack { inner, depth, frames: VecDeque::new() }
    }

    fn push (& mut self, frame: Observation)
    {
        if self.frames.len() == self.depth
        {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    fn stacked (& self) -> Observation
    {
        self.frames.iter().flatten().copied().collect()
    }
}

impl Environment for FrameStack
{
    fn reset (& mut self) -> Observation
    {
        let frame = self.inner.reset();

        self.frames.clear();
        for _ in 0 .. self.depth
        {
            self.frames.push_back(frame.clone());
        }

        self.stacked()
    }

    fn step (& mut self, action: usize) -> Result<StepResult>
    {
        let result = self.inner.step(action)?;
        self.push(result.observation);

        Ok(StepResult { observation: self.stacked(), reward: result.reward, done: result.done })
    }

    fn actions_mask (& self) -> Vec<bool>
    {
        self.inner.actions_mask()
    }

    fn num_actions (& self) -> usize
    {
        self.inner.num_actions()
    }

    fn observation_dim (& self) -> usize
    {
        self.inner.observation_dim() * self.depth
    }

    fn id (& self) -> String
    {
        self.inner.id()
    }

    fn current_player (& self) -> usize
    {
        self.inner.current_player()
    }

    fn opponent_player (& self) -> usize
    {
        self.inner.opponent_player()
    }
}
