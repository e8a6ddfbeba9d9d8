
pub mod config;
pub mod mcts;
pub mod model;
pub mod pipeline;
pub mod replay;
