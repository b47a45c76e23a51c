pub mod buffer_pool;
pub mod graph;
pub mod types;


pub use graph::AudioGraph;
pub use types::{Connection, ConnectionKey, NodeId};
