
pub mod config;
pub mod node;
pub mod searcher;

pub use searcher::{SearchResult, Searcher};
