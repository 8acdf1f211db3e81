// Job DTO handed out by the tracker
// Decision: the payload stays an opaque JSON value; extraction workers own its schema

use serde::{Deserialize, Serialize};

/// One unit of indexing work.
///
/// The runtime only ever looks at the identifier, the human-readable
/// description, and the timeout; everything an extraction executor needs
/// travels in `payload` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Tracker-assigned job identifier
    pub id: String,

    /// Human-readable description, echoed in status frames
    #[serde(default)]
    pub description: String,

    /// Executor time budget in seconds, advisory for the supervisor
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Domain-specific job body, opaque to the runtime
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn default_timeout() -> u64 {
    3600
}

impl Job {
    /// Create a job with an empty payload (mostly useful in tests)
    pub fn new(id: impl Into<String>, description: impl Into<String>, timeout: u64) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            timeout,
            payload: serde_json::Value::Null,
        }
    }
}
