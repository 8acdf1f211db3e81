// Quarry worker runtime
// Decision: every collaborator is an explicit object injected at construction
// time; no process-wide status singleton, so tests supply their own doubles
// Decision: stdout carries status frames only; logging goes to stderr

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod identity;
pub mod runtime;
pub mod source;
pub mod status;
pub mod tracker;

// Re-export main types
pub use command::CommandChannel;
pub use config::WorkerConfig;
pub use error::{JobError, Result, WorkerError};
pub use executor::JobExecutor;
pub use runtime::{RunState, WorkerRuntime};
pub use source::{JobFactory, JobSource, JsonJobFactory};
pub use status::StatusChannel;
pub use tracker::{MessageChannel, TcpMessageChannel, TrackerClient};
