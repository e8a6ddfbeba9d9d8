
use utils::{Serialize, Deserialize};

///
/// One environment step as recorded by a self-play actor: the observation
/// the decision was made from, the action taken, the reward received, the
/// search's visit distribution and root value at that point, and the
/// player who moved.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition
{
    pub observation: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub visit_distribution: Vec<f32>,
    pub root_value: f32,
    pub player: usize
}

///
/// A completed episode, produced by exactly one actor and consumed exactly
/// once by the data collector.
///
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trajectory
{
    pub transitions: Vec<Transition>
}

impl Trajectory
{
    pub fn new () -> Trajectory
    {
        Trajectory { transitions: Vec::new() }
    }

    pub fn push (& mut self, transition: Transition)
    {
        self.transitions.push(transition);
    }

    pub fn len (& self) -> usize
    {
        self.transitions.len()
    }

    pub fn is_empty (& self) -> bool
    {
        self.transitions.is_empty()
    }

    ///
    /// The n-step bootstrapped return from the given index: up to `n_step`
    /// real discounted rewards, plus the discounted search root value at
    /// the bootstrap horizon when the episode extends that far. Rewards
    /// and the bootstrap are signed into the perspective of the player at
    /// `from` so two-player episodes train consistently.
    ///
    pub fn n_step_return (& self, from: usize, n_step: usize, discount: f32) -> f32
    {
        let transitions = & self.transitions;
        let player = transitions[from].player;

        let mut value = 0.0;
        for offset in 0 .. n_step.min(transitions.len() - from)
        {
            let transition = & transitions[from + offset];
            let sign = match transition.player == player { true => 1.0, false => -1.0 };
            value += sign * discount.powi(offset as i32) * transition.reward;
        }

        if from + n_step < transitions.len()
        {
            let bootstrap = & transitions[from + n_step];
            let sign = match bootstrap.player == player { true => 1.0, false => -1.0 };
            value += sign * discount.powi(n_step as i32) * bootstrap.root_value;
        }

        value
    }
}

///
/// A stored training sample: one starting observation together with the
/// action/target windows needed to unroll the model `K` steps and regress
/// it against what the search and the environment actually produced.
///
/// Windows crossing the episode end are padded with absorbing targets
/// (zero value, zero reward, uniform policy, repeated last action), so no
/// sample ever refers to a transition that does not exist.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnrollSample
{
    pub observation: Vec<f32>,
    pub actions: Vec<usize>,
    pub target_values: Vec<f32>,
    pub target_rewards: Vec<f32>,
    pub target_policies: Vec<Vec<f32>>
}

///
/// Slices a completed trajectory into one unroll sample per position,
/// each paired with its initial priority: the absolute error between the
/// search root value and the n-step return it will be trained towards.
///
pub fn make_unroll_samples (
    trajectory: & Trajectory,
    n_step: usize,
    unroll_steps: usize,
    discount: f32
) -> Vec<(UnrollSample, f32)>
{
    let transitions = & trajectory.transitions;
    let len = transitions.len();

    let mut samples = Vec::with_capacity(len);

    for start in 0 .. len
    {
        let num_actions = transitions[start].visit_distribution.len();
        let uniform = vec![1.0 / num_actions as f32; num_actions];

        let mut actions = Vec::with_capacity(unroll_steps);
        let mut target_rewards = Vec::with_capacity(unroll_steps);
        let mut target_values = Vec::with_capacity(unroll_steps + 1);
        let mut target_policies = Vec::with_capacity(unroll_steps + 1);

        for k in 0 ..= unroll_steps
        {
            let index = start + k;

            match index < len
            {
                true =>
                {
                    target_values.push(trajectory.n_step_return(index, n_step, discount));
                    target_policies.push(transitions[index].visit_distribution.clone());
                },
                false =>
                {
                    // Past the terminal state the targets are absorbing.
                    target_values.push(0.0);
                    target_policies.push(uniform.clone());
                }
            }

            if k < unroll_steps
            {
                match index < len
                {
                    true =>
                    {
                        actions.push(transitions[index].action);
                        target_rewards.push(transitions[index].reward);
                    },
                    false =>
                    {
                        actions.push(transitions[len - 1].action);
                        target_rewards.push(0.0);
                    }
                }
            }
        }

        let priority = (transitions[start].root_value - target_values[0]).abs().max(1e-3);

        let sample = UnrollSample
        {
            observation: transitions[start].observation.clone(),
            actions,
            target_values,
            target_rewards,
            target_policies
        };

        samples.push((sample, priority));
    }

    samples
}
