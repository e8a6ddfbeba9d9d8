
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use utils::error::*;

use super::env::*;

const GRAVITY : f32 = 9.8;
const CART_MASS : f32 = 1.0;
const POLE_MASS : f32 = 0.1;
const POLE_HALF_LENGTH : f32 = 0.5;
const FORCE_MAGNITUDE : f32 = 10.0;
const TAU : f32 = 0.02;

const X_THRESHOLD : f32 = 2.4;
const THETA_THRESHOLD : f32 = 12.0 * std::f32::consts::PI / 180.0;

///
/// The classic cart-pole balancing problem, integrated with the usual
/// Euler step. Two actions (push left, push right), a four-dimensional
/// observation of cart position/velocity and pole angle/angular velocity,
/// and a reward of one per step until the pole falls, the cart leaves the
/// track, or the step limit is reached.
///
pub struct CartPole
{
    rng: StdRng,
    state: [f32; 4],
    steps: usize,
    max_steps: usize,
    done: bool
}

impl CartPole
{
    ///
    /// Creates a seeded cart-pole instance with the given episode length cap.
    ///
    pub fn new (seed: u64, max_steps: usize) -> CartPole
    {
        CartPole
        {
            rng: StdRng::seed_from_u64(seed),
            state: [0.0; 4],
            steps: 0,
            max_steps,
            done: true
        }
    }
}

impl Environment for CartPole
{
    fn reset (& mut self) -> Observation
    {
        for value in self.state.iter_mut()
        {
            * value = self.rng.gen_range(-0.05 .. 0.05);
        }

        self.steps = 0;
        self.done = false;

        self.state.to_vec()
    }

    fn step (& mut self, action: usize) -> Result<StepResult>
    {
        if action >= 2 || self.done
        {
            return Err(GymError::IllegalAction(action).into());
        }

        let [x, x_dot, theta, theta_dot] = self.state;

        let force = match action { 1 => FORCE_MAGNITUDE, _ => - FORCE_MAGNITUDE };
        let total_mass = CART_MASS + POLE_MASS;
        let polemass_length = POLE_MASS * POLE_HALF_LENGTH;

        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        let temp = (force + polemass_length * theta_dot * theta_dot * sin_theta) / total_mass;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / total_mass));
        let x_acc = temp - polemass_length * theta_acc * cos_theta / total_mass;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc
        ];

        self.steps += 1;

        let fell = self.state[0].abs() > X_THRESHOLD || self.state[2].abs() > THETA_THRESHOLD;
        self.done = fell || self.steps >= self.max_steps;

        Ok(StepResult { observation: self.state.to_vec(), reward: 1.0, done: self.done })
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
        4
    }

    fn id (& self) -> String
    {
        format!("CartPole-v{}", if self.max_steps >= 500 { 1 } else { 0 })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn identical_seeds_give_identical_episodes ()
    {
        let mut lhs = CartPole::new(7, 500);
        let mut rhs = CartPole::new(7, 500);

        assert_eq!(lhs.reset(), rhs.reset());

        for action in [0, 1, 1, 0, 1]
        {
            let a = lhs.step(action).unwrap();
            let b = rhs.step(action).unwrap();
            assert_eq!(a.observation, b.observation);
            assert_eq!(a.done, b.done);
        }
    }

    #[test]
    fn constant_pushing_ends_the_episode ()
    {
        let mut env = CartPole::new(3, 500);
        env.reset();

        let mut steps = 0;
        loop
        {
            let result = env.step(1).unwrap();
            steps += 1;
            if result.done
            {
                break;
            }
        }

        // Pushing one way forever tips the pole over well before the cap.
        assert!(steps < 500);
    }

    #[test]
    fn stepping_a_finished_episode_is_an_error ()
    {
        let mut env = CartPole::new(3, 500);
        assert!(env.step(0).is_err());
    }
}
