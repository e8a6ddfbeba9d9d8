
pub mod checkpoint;
pub mod config;
pub mod network;
pub mod optim;

pub use checkpoint::Checkpoint;
pub use network::{Gradients, Network, NetworkOutput, UnrollLoss};
pub use optim::{Adam, MultiStepLR};
