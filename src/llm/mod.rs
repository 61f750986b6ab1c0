// Adapter layer for the natural-language query engine

pub mod engine;
pub mod local;
pub mod provider;

pub use engine::{QueryCache, QueryEngine, QueryOptions};
pub use local::LocalAdapter;
pub use provider::QueryAdapter;
