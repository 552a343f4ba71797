pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::NodeConfig;
pub use error::NodeError;
pub use state::NodeState;
