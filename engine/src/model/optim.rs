
use utils::{Serialize, Deserialize};

use super::network::{Gradients, Network};

///
/// Adam with L2 weight decay folded into the gradient, holding first and
/// second moment
/// buffers shaped like the network's parameter list. The buffers are part
/// of the training checkpoint so a resumed run continues with identical
/// optimizer state.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adam
{
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    l2_decay: f32,
    steps: usize,
    m: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>
}

impl Adam
{
    pub fn new (network: & Network, beta1: f32, beta2: f32, epsilon: f32, l2_decay: f32) -> Adam
    {
        let shapes : Vec<usize> = network.params().iter().map(|p| p.len()).collect();

        Adam
        {
            beta1,
            beta2,
            epsilon,
            l2_decay,
            steps: 0,
            m: shapes.iter().map(|& n| vec![0.0; n]).collect(),
            v: shapes.iter().map(|& n| vec![0.0; n]).collect()
        }
    }

    ///
    /// Applies one update to the network parameters in place.
    ///
    pub fn step (& mut self, network: & mut Network, grads: & Gradients, learning_rate: f32)
    {
        self.steps += 1;

        let correction1 = 1.0 - self.beta1.powi(self.steps as i32);
        let correction2 = 1.0 - self.beta2.powi(self.steps as i32);

        let flat = grads.flat();
        for (index, param) in network.params_mut().into_iter().enumerate()
        {
            let m = & mut self.m[index];
            let v = & mut self.v[index];
            let grad = flat[index];

            for i in 0 .. param.len()
            {
                let g = grad[i] + self.l2_decay * param[i];

                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;

                let m_hat = m[i] / correction1;
                let v_hat = v[i] / correction2;

                param[i] -= learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}

///
/// A piecewise-constant learning-rate schedule: the base rate decays by a
/// fixed factor at each configured step boundary.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiStepLR
{
    base_rate: f32,
    decay: f32,
    boundaries: Vec<usize>,
    last_step: usize
}

impl MultiStepLR
{
    pub fn new (base_rate: f32, decay: f32, boundaries: Vec<usize>) -> MultiStepLR
    {
        MultiStepLR { base_rate, decay, boundaries, last_step: 0 }
    }

    ///
    /// The learning rate for the current step.
    ///
    pub fn rate (& self) -> f32
    {
        let crossed = self.boundaries.iter().filter(|& & b| self.last_step >= b).count();
        self.base_rate * self.decay.powi(crossed as i32)
    }

    ///
    /// Advances the schedule by one training step.
    ///
    pub fn step (& mut self)
    {
        self.last_step += 1;
    }
}
