pub mod executors;
pub mod registry;

// Re-export main types
pub use executors::NoopExecutor;
pub use registry::{ExecutorFactory, ExecutorRegistry, ExecutorRegistryBuilder};
