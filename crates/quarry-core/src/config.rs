// Worker configuration
// Decision: resolved once from the environment at startup, immutable afterwards;
// the only mutation point is merging the tracker's hello reply before the loop starts

use std::path::PathBuf;
use std::time::Duration;

use quarry_contracts::ConfigPatch;

use crate::error::{Result, WorkerError};

/// How long an idle worker keeps polling before it terminates itself.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 1800;

/// Pause between empty checkout rounds so an idle worker does not spin the tracker.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Configuration for one worker process
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Category of job this worker checks out
    pub job_type: String,
    /// Tracker checkout endpoint (`host:port`)
    pub tracker_addr: Option<String>,
    /// Optional foreman endpoint for outbound signaling
    pub foreman_addr: Option<String>,
    /// If set, bypasses the tracker and supplies exactly one job
    pub single_job_file: Option<PathBuf>,
    /// Voluntary exit after this many processed jobs (process recycling)
    pub max_jobs: Option<u32>,
    /// Inactivity window measured from the last started job
    pub idle_timeout: Duration,
    /// Sleep between empty checkout rounds
    pub poll_interval: Duration,
}

impl WorkerConfig {
    /// Create a configuration with defaults for everything but the job type
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            tracker_addr: None,
            foreman_addr: None,
            single_job_file: None,
            max_jobs: None,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var("QUARRY_JOB_TYPE").unwrap_or_default());
        config.tracker_addr = std::env::var("QUARRY_TRACKER_ADDR").ok();
        config.foreman_addr = std::env::var("QUARRY_FOREMAN_ADDR").ok();
        config.single_job_file = std::env::var("QUARRY_JOB_FILE").ok().map(PathBuf::from);
        config.max_jobs = std::env::var("QUARRY_MAX_JOBS")
            .ok()
            .and_then(|v| v.parse().ok());
        if let Some(secs) = std::env::var("QUARRY_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = std::env::var("QUARRY_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.poll_interval = Duration::from_millis(ms);
        }
        config
    }

    /// Set the tracker endpoint
    pub fn with_tracker_addr(mut self, addr: impl Into<String>) -> Self {
        self.tracker_addr = Some(addr.into());
        self
    }

    /// Set the one-shot job file
    pub fn with_job_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.single_job_file = Some(path.into());
        self
    }

    /// Cap the number of jobs before voluntary exit
    pub fn with_max_jobs(mut self, max: u32) -> Self {
        self.max_jobs = Some(max);
        self
    }

    /// Set the inactivity window
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the empty-round pause
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Check that the configuration describes a runnable worker
    ///
    /// # Errors
    ///
    /// Returns an error if the job type is missing, or if neither/both of
    /// tracker address and job file are set.
    pub fn validate(&self) -> Result<()> {
        if self.job_type.is_empty() {
            return Err(WorkerError::config("a job type is required"));
        }
        match (&self.tracker_addr, &self.single_job_file) {
            (None, None) => Err(WorkerError::config(
                "either a tracker address or a single job file is required",
            )),
            (Some(_), Some(_)) => Err(WorkerError::config(
                "tracker address and single job file are mutually exclusive",
            )),
            _ => Ok(()),
        }
    }

    /// Merge the tracker's hello reply into this configuration.
    ///
    /// Recognized members: `trackerAddr`, `pollIntervalMs`, `idleTimeoutSecs`.
    /// Anything else in the patch is ignored.
    pub fn apply_patch(&mut self, patch: &ConfigPatch) {
        if let Some(addr) = patch.get("trackerAddr").and_then(|v| v.as_str()) {
            self.tracker_addr = Some(addr.to_string());
        }
        if let Some(ms) = patch.get("pollIntervalMs").and_then(|v| v.as_u64()) {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = patch.get("idleTimeoutSecs").and_then(|v| v.as_u64()) {
            self.idle_timeout = Duration::from_secs(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_job_type() {
        let config = WorkerConfig::new("").with_tracker_addr("127.0.0.1:7070");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_one_source() {
        assert!(WorkerConfig::new("parcels").validate().is_err());

        let both = WorkerConfig::new("parcels")
            .with_tracker_addr("127.0.0.1:7070")
            .with_job_file("/tmp/job.json");
        assert!(both.validate().is_err());

        let tracker = WorkerConfig::new("parcels").with_tracker_addr("127.0.0.1:7070");
        assert!(tracker.validate().is_ok());

        let file = WorkerConfig::new("parcels").with_job_file("/tmp/job.json");
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_apply_patch() {
        let mut config = WorkerConfig::new("parcels").with_tracker_addr("127.0.0.1:7070");
        config.apply_patch(&serde_json::json!({
            "trackerAddr": "10.0.0.5:7070",
            "pollIntervalMs": 250,
            "idleTimeoutSecs": 60,
            "somethingElse": true,
        }));

        assert_eq!(config.tracker_addr.as_deref(), Some("10.0.0.5:7070"));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_apply_patch_ignores_wrong_types() {
        let mut config = WorkerConfig::new("parcels");
        config.apply_patch(&serde_json::json!({"pollIntervalMs": "soon"}));
        assert_eq!(
            config.poll_interval,
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
    }
}
