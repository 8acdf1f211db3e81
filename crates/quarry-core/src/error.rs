// Error types for the worker runtime
//
// Two explicit categories instead of an exception hierarchy:
// - recoverable: Protocol (a bad tracker reply costs one checkout round)
// - fatal: Transport, Config, JobExecution (the loop ends, teardown still runs)
// Teardown errors have no variant here; shutdown is best-effort and swallows them.

use thiserror::Error;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur in the worker runtime
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Malformed or missing tracker reply; costs one checkout round, never the process
    #[error("tracker protocol error: {0}")]
    Protocol(String),

    /// The checkout/signal socket or the status stream cannot be used
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Invalid or incomplete worker configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A job failed; a single failed job brings the worker down
    #[error("job {job_id} failed: {message}")]
    JobExecution { job_id: String, message: String },
}

impl WorkerError {
    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        WorkerError::Protocol(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        WorkerError::Config(msg.into())
    }

    /// Create a fatal job-execution error
    pub fn job_execution(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        WorkerError::JobExecution {
            job_id: job_id.into(),
            message: message.into(),
        }
    }
}

/// The failure type a [`crate::JobExecutor`] is allowed to raise.
///
/// This is the only error the runtime catches around a running job; anything
/// else an executor does wrong should be mapped into it.
#[derive(Debug, Error)]
pub enum JobError {
    /// The extraction/transform work itself failed
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Unexpected executor-internal error
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl JobError {
    /// Create an extraction failure
    pub fn extraction(msg: impl Into<String>) -> Self {
        JobError::Extraction(msg.into())
    }
}
