// Status frame vocabulary shared by workers and the foreman
// Decision: the field separator is a strict substring of the frame flag, so a
// reader can split frame contents on the separator after trimming the flags

use serde::{Deserialize, Serialize};

/// Begin/end marker wrapping every status frame on stdout.
pub const FRAME_FLAG: &str = "@&@&";

/// Field delimiter inside a frame; a substring of [`FRAME_FLAG`].
pub const FIELD_SEP: &str = "@&";

/// Single-letter field keys used inside a frame.
pub mod keys {
    /// Free-form message
    pub const MESSAGE: char = 'M';
    /// Progress fraction, 3-decimal fixed point in [0,1]
    pub const PERCENT: char = 'P';
    /// Name of the phase the progress belongs to
    pub const PHASE: char = 'N';
    /// Job identifier
    pub const JOB_ID: char = 'J';
    /// Job timeout in seconds
    pub const TIMEOUT: char = 'T';
    /// Lifecycle state, one of [`super::WorkerState`]
    pub const STATE: char = 'S';
    /// Worker identity (VPID)
    pub const VPID: char = 'V';
}

/// Lifecycle states a worker reports to its foreman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    Success,
    Failed,
    Idle,
    Stopping,
    Warning,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Success => "SUCCESS",
            WorkerState::Failed => "FAILED",
            WorkerState::Idle => "IDLE",
            WorkerState::Stopping => "STOPPING",
            WorkerState::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
