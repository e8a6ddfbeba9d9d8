
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use utils::{Serialize, Deserialize};

use super::config::Config as ModelConfig;

///
/// A fully-connected layer with a row-major weight matrix.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dense
{
    pub rows: usize,
    pub cols: usize,
    pub w: Vec<f32>,
    pub b: Vec<f32>
}

impl Dense
{
    ///
    /// Creates a layer with weights drawn uniformly from the usual
    /// fan-in-scaled range.
    ///
    pub fn new (rows: usize, cols: usize, rng: & mut StdRng) -> Dense
    {
        let bound = 1.0 / (cols as f32).sqrt();
        let w = (0 .. rows * cols).map(|_| rng.gen_range(- bound .. bound)).collect();
        let b = vec![0.0; rows];

        Dense { rows, cols, w, b }
    }

    ///
    /// Computes `w x + b`.
    ///
    pub fn forward (& self, x: & [f32]) -> Vec<f32>
    {
        let mut y = self.b.clone();
        for i in 0 .. self.rows
        {
            let row = & self.w[i * self.cols .. (i + 1) * self.cols];
            y[i] += row.iter().zip(x).map(|(w, x)| w * x).sum::<f32>();
        }

        y
    }

    ///
    /// Accumulates the parameter gradients for the given upstream gradient
    /// and returns the gradient with respect to the input.
    ///
    pub fn backward (& self, x: & [f32], dy: & [f32], grad: & mut DenseGrad) -> Vec<f32>
    {
        let mut dx = vec![0.0; self.cols];

        for i in 0 .. self.rows
        {
            grad.db[i] += dy[i];
            for j in 0 .. self.cols
            {
                grad.dw[i * self.cols + j] += dy[i] * x[j];
                dx[j] += self.w[i * self.cols + j] * dy[i];
            }
        }

        dx
    }
}

///
/// Gradient accumulator matching one `Dense` layer.
///
#[derive(Clone, Debug)]
pub struct DenseGrad
{
    pub dw: Vec<f32>,
    pub db: Vec<f32>
}

impl DenseGrad
{
    pub fn zeros (layer: & Dense) -> DenseGrad
    {
        DenseGrad { dw: vec![0.0; layer.w.len()], db: vec![0.0; layer.b.len()] }
    }
}

///
/// Gradients for every parameter of a network, in the same order as
/// `Network::params`.
///
#[derive(Clone, Debug)]
pub struct Gradients
{
    pub layers: Vec<DenseGrad>
}

impl Gradients
{
    ///
    /// Flattens the accumulator into per-parameter-buffer slices.
    ///
    pub fn flat (& self) -> Vec<& [f32]>
    {
        self.layers.iter().flat_map(|g| [g.dw.as_slice(), g.db.as_slice()]).collect()
    }

    ///
    /// Scales every gradient in place, e.g. by the reciprocal batch size.
    ///
    pub fn scale (& mut self, factor: f32)
    {
        for grad in self.layers.iter_mut()
        {
            grad.dw.iter_mut().for_each(|g| * g *= factor);
            grad.db.iter_mut().for_each(|g| * g *= factor);
        }
    }

    ///
    /// The L2 norm over every accumulated gradient.
    ///
    pub fn global_norm (& self) -> f32
    {
        self.flat().iter()
            .flat_map(|slice| slice.iter())
            .map(|g| g * g)
            .sum::<f32>()
            .sqrt()
    }

    ///
    /// Rescales the gradients so their global norm does not exceed the
    /// given bound.
    ///
    pub fn clip_global_norm (& mut self, max_norm: f32)
    {
        let norm = self.global_norm();
        if norm > max_norm && norm > 0.0
        {
            self.scale(max_norm / norm);
        }
    }
}

///
/// The output of one model evaluation: the (next) latent state, the policy
/// distribution over every action, the value estimate, and the predicted
/// immediate reward of the step taken (zero for the initial evaluation).
///
#[derive(Clone, Debug)]
pub struct NetworkOutput
{
    pub latent: Vec<f32>,
    pub policy: Vec<f32>,
    pub value: f32,
    pub reward: f32
}

///
/// The loss breakdown for one unrolled sample.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct UnrollLoss
{
    pub total: f32,
    pub value_error: f32
}

///
/// The predictive model: a representation function mapping observations
/// into a latent state, a dynamics function unrolling the latent state by
/// one action while predicting the step reward, and a prediction function
/// producing a policy distribution and a value estimate from any latent
/// state.
///
/// Everything is a small tanh MLP with hand-written gradients; the search
/// and training machinery only ever touches `initial_inference`,
/// `recurrent_inference` and `unroll_loss`.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network
{
    pub observation_dim: usize,
    pub num_actions: usize,
    pub latent_dim: usize,

    repr_hidden: Dense,
    repr_out: Dense,
    dynamics: Dense,
    reward: Dense,
    policy: Dense,
    value: Dense
}

///
/// Loss contributions past the first unrolled step are scaled down by the
/// unroll length, and the latent gradient is halved across each dynamics
/// application to keep deep unrolls stable.
///
const DYNAMICS_GRADIENT_SCALE : f32 = 0.5;

impl Network
{
    pub fn new (config: & ModelConfig, observation_dim: usize, num_actions: usize, seed: u64) -> Network
    {
        let mut rng = StdRng::seed_from_u64(seed);

        let planes = config.num_planes;
        let latent = config.hidden_size;

        Network
        {
            observation_dim,
            num_actions,
            latent_dim: latent,

            repr_hidden: Dense::new(planes, observation_dim, & mut rng),
            repr_out: Dense::new(latent, planes, & mut rng),
            dynamics: Dense::new(latent, latent + num_actions, & mut rng),
            reward: Dense::new(1, latent, & mut rng),
            policy: Dense::new(num_actions, latent, & mut rng),
            value: Dense::new(1, latent, & mut rng)
        }
    }

    ///
    /// The parameter buffers in a fixed order, shared with `Gradients` and
    /// the optimizer.
    ///
    pub fn params (& self) -> Vec<& [f32]>
    {
        self.layers().into_iter().flat_map(|l| [l.w.as_slice(), l.b.as_slice()]).collect()
    }

    pub fn params_mut (& mut self) -> Vec<& mut [f32]>
    {
        let Network { repr_hidden, repr_out, dynamics, reward, policy, value, .. } = self;

        vec![
            repr_hidden.w.as_mut_slice(), repr_hidden.b.as_mut_slice(),
            repr_out.w.as_mut_slice(), repr_out.b.as_mut_slice(),
            dynamics.w.as_mut_slice(), dynamics.b.as_mut_slice(),
            reward.w.as_mut_slice(), reward.b.as_mut_slice(),
            policy.w.as_mut_slice(), policy.b.as_mut_slice(),
            value.w.as_mut_slice(), value.b.as_mut_slice()
        ]
    }

    ///
    /// An all-zero gradient accumulator shaped like this network.
    ///
    pub fn zero_gradients (& self) -> Gradients
    {
        Gradients { layers: self.layers().into_iter().map(DenseGrad::zeros).collect() }
    }

    fn layers (& self) -> [& Dense; 6]
    {
        [& self.repr_hidden, & self.repr_out, & self.dynamics, & self.reward, & self.policy, & self.value]
    }

    ///
    /// Encodes an observation and evaluates the prediction heads on it.
    ///
    pub fn initial_inference (& self, observation: & [f32]) -> NetworkOutput
    {
        let latent = self.represent(observation);
        let (policy, value) = self.predict(& latent);

        NetworkOutput { latent, policy, value, reward: 0.0 }
    }

    ///
    /// Unrolls the latent state by one action and evaluates the prediction
    /// heads on the resulting state.
    ///
    pub fn recurrent_inference (& self, latent: & [f32], action: usize) -> NetworkOutput
    {
        let (next, reward) = self.dynamics(latent, action);
        let (policy, value) = self.predict(& next);

        NetworkOutput { latent: next, policy, value, reward }
    }

    fn represent (& self, observation: & [f32]) -> Vec<f32>
    {
        let hidden = tanh(self.repr_hidden.forward(observation));
        tanh(self.repr_out.forward(& hidden))
    }

    fn dynamics (& self, latent: & [f32], action: usize) -> (Vec<f32>, f32)
    {
        let input = self.dynamics_input(latent, action);
        let next = tanh(self.dynamics.forward(& input));
        let reward = self.reward.forward(& next)[0];

        (next, reward)
    }

    fn predict (& self, latent: & [f32]) -> (Vec<f32>, f32)
    {
        let policy = softmax(& self.policy.forward(latent));
        let value = self.value.forward(latent)[0];

        (policy, value)
    }

    fn dynamics_input (& self, latent: & [f32], action: usize) -> Vec<f32>
    {
        let mut input = vec![0.0; self.latent_dim + self.num_actions];
        input[.. self.latent_dim].copy_from_slice(latent);
        input[self.latent_dim + action.min(self.num_actions - 1)] = 1.0;

        input
    }

    ///
    /// Runs the training forward/backward pass for one unrolled sample and
    /// accumulates the (importance-weighted) gradients.
    ///
    /// `actions` holds the K actions taken from the sampled position;
    /// `target_values` and `target_policies` cover positions 0..=K and
    /// `target_rewards` the K observed step rewards. The reported
    /// `value_error` is the absolute error of the first value prediction,
    /// which the learner feeds back as the sample's new priority.
    ///
    pub fn unroll_loss (
        & self,
        observation: & [f32],
        actions: & [usize],
        target_values: & [f32],
        target_rewards: & [f32],
        target_policies: & [Vec<f32>],
        weight: f32,
        grads: & mut Gradients
    ) -> UnrollLoss
    {
        let unroll = actions.len();
        debug_assert_eq!(target_values.len(), unroll + 1);
        debug_assert_eq!(target_policies.len(), unroll + 1);
        debug_assert_eq!(target_rewards.len(), unroll);

        // Forward pass, keeping every intermediate activation.

        let hidden = tanh(self.repr_hidden.forward(observation));
        let mut latents = vec![tanh(self.repr_out.forward(& hidden))];
        let mut dynamics_inputs = Vec::with_capacity(unroll);
        let mut rewards = Vec::with_capacity(unroll);

        for & action in actions
        {
            let input = self.dynamics_input(latents.last().unwrap(), action);
            let next = tanh(self.dynamics.forward(& input));
            rewards.push(self.reward.forward(& next)[0]);
            dynamics_inputs.push(input);
            latents.push(next);
        }

        let mut policies = Vec::with_capacity(unroll + 1);
        let mut values = Vec::with_capacity(unroll + 1);
        for latent in & latents
        {
            let (policy, value) = self.predict(latent);
            policies.push(policy);
            values.push(value);
        }

        // Loss and backward pass, walking the unroll from the last step
        // back to the representation.

        let step_scale = |k: usize| if k == 0 { 1.0 } else { 1.0 / unroll.max(1) as f32 };

        let mut loss = UnrollLoss::default();
        let mut dlatent = vec![0.0; self.latent_dim];

        let (grad_repr_hidden, rest) = grads.layers.split_at_mut(1);
        let (grad_repr_out, rest) = rest.split_at_mut(1);
        let (grad_dynamics, rest) = rest.split_at_mut(1);
        let (grad_reward, rest) = rest.split_at_mut(1);
        let (grad_policy, grad_value) = rest.split_at_mut(1);

        for k in (0 ..= unroll).rev()
        {
            let scale = step_scale(k);
            let latent = & latents[k];

            // Policy cross-entropy against the search visit distribution.

            let cross_entropy : f32 = target_policies[k].iter()
                .zip(& policies[k])
                .map(|(t, p)| - t * p.max(1e-8).ln())
                .sum();
            loss.total += scale * cross_entropy;

            let dlogits : Vec<f32> = policies[k].iter()
                .zip(& target_policies[k])
                .map(|(p, t)| scale * weight * (p - t))
                .collect();
            add(& mut dlatent, & self.policy.backward(latent, & dlogits, & mut grad_policy[0]));

            // Value regression against the n-step return.

            let value_error = values[k] - target_values[k];
            loss.total += scale * value_error * value_error;
            if k == 0
            {
                loss.value_error = value_error.abs();
            }

            let dvalue = [scale * weight * 2.0 * value_error];
            add(& mut dlatent, & self.value.backward(latent, & dvalue, & mut grad_value[0]));

            if k > 0
            {
                // Reward regression against the observed step reward.

                let reward_error = rewards[k - 1] - target_rewards[k - 1];
                loss.total += scale * reward_error * reward_error;

                let dreward = [scale * weight * 2.0 * reward_error];
                add(& mut dlatent, & self.reward.backward(latent, & dreward, & mut grad_reward[0]));

                // Through the dynamics tanh and back into the previous latent.

                let dpre = tanh_backward(latent, & dlatent);
                let dinput = self.dynamics.backward(& dynamics_inputs[k - 1], & dpre, & mut grad_dynamics[0]);

                dlatent = dinput[.. self.latent_dim].to_vec();
                dlatent.iter_mut().for_each(|g| * g *= DYNAMICS_GRADIENT_SCALE);
            }
        }

        // Through the representation stack.

        let dpre = tanh_backward(& latents[0], & dlatent);
        let dhidden = self.repr_out.backward(& hidden, & dpre, & mut grad_repr_out[0]);
        let dpre_hidden = tanh_backward(& hidden, & dhidden);
        self.repr_hidden.backward(observation, & dpre_hidden, & mut grad_repr_hidden[0]);

        loss
    }
}

fn tanh (mut x: Vec<f32>) -> Vec<f32>
{
    x.iter_mut().for_each(|v| * v = v.tanh());
    x
}

fn tanh_backward (y: & [f32], dy: & [f32]) -> Vec<f32>
{
    y.iter().zip(dy).map(|(y, dy)| dy * (1.0 - y * y)).collect()
}

fn add (acc: & mut [f32], rhs: & [f32])
{
    acc.iter_mut().zip(rhs).for_each(|(a, b)| * a += b);
}

fn softmax (logits: & [f32]) -> Vec<f32>
{
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps : Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let total : f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::optim::Adam;

    fn small_network () -> Network
    {
        let config = ModelConfig { num_planes: 8, hidden_size: 4 };
        Network::new(& config, 2, 2, 11)
    }

    #[test]
    fn inference_shapes_are_consistent ()
    {
        let net = small_network();

        let initial = net.initial_inference(& [0.5, -0.5]);
        assert_eq!(initial.latent.len(), 4);
        assert_eq!(initial.policy.len(), 2);
        assert_eq!(initial.reward, 0.0);
        assert!((initial.policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        let recurrent = net.recurrent_inference(& initial.latent, 1);
        assert_eq!(recurrent.latent.len(), 4);
        assert!((recurrent.policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn identical_seeds_build_identical_networks ()
    {
        let lhs = small_network();
        let rhs = small_network();
        assert_eq!(lhs, rhs);

        let a = lhs.initial_inference(& [0.25, 0.75]);
        let b = rhs.initial_inference(& [0.25, 0.75]);
        assert_eq!(a.policy, b.policy);
        assert_eq!(a.value, b.value);
    }

    #[test]
    fn gradient_steps_reduce_the_unroll_loss ()
    {
        let mut net = small_network();
        let mut adam = Adam::new(& net, 0.9, 0.999, 1e-8, 0.0);

        let observation = [1.0, 0.0];
        let actions = [1, 0];
        let target_values = [1.5, 1.0, 0.5];
        let target_rewards = [1.0, 0.0];
        let target_policies = vec![vec![0.2, 0.8], vec![0.7, 0.3], vec![0.5, 0.5]];

        let loss_of = |net: & Network| {
            let mut scratch = net.zero_gradients();
            net.unroll_loss(& observation, & actions, & target_values, & target_rewards, & target_policies, 1.0, & mut scratch).total
        };

        let before = loss_of(& net);

        for _ in 0 .. 200
        {
            let mut grads = net.zero_gradients();
            net.unroll_loss(& observation, & actions, & target_values, & target_rewards, & target_policies, 1.0, & mut grads);
            adam.step(& mut net, & grads, 0.01);
        }

        let after = loss_of(& net);
        assert!(after < before, "loss went from {} to {}", before, after);
    }

    #[test]
    fn clipping_bounds_the_global_norm ()
    {
        let net = small_network();
        let mut grads = net.zero_gradients();

        net.unroll_loss(
            & [100.0, -100.0], & [0], & [100.0, -100.0], & [50.0],
            & vec![vec![1.0, 0.0], vec![0.0, 1.0]], 1.0, & mut grads
        );

        grads.clip_global_norm(1.0);
        assert!(grads.global_norm() <= 1.0 + 1e-4);
    }
}
