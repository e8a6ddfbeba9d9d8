
pub mod config;
pub mod store;
pub mod trajectory;

pub use store::{PrioritizedReplay, ReplayState};
pub use trajectory::{Trajectory, Transition, UnrollSample, make_unroll_samples};
