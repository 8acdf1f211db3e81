// Job source and job factory
// Decision: the runtime depends on the JobFactory capability, never on a
// concrete job family; each family parses its own wire shape
// Decision: a single-job-file source never talks to a tracker; it exists
// for manual, one-off invocations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use quarry_contracts::Job;

use crate::error::{Result, WorkerError};
use crate::tracker::TrackerClient;

/// Capability for turning raw job material into a [`Job`].
#[async_trait]
pub trait JobFactory: Send + Sync {
    /// Parse a job object as handed out by the tracker
    fn from_value(&self, value: Value) -> Result<Job>;

    /// Load and parse a job from a local file
    async fn from_file(&self, path: &Path) -> Result<Job>;
}

/// Default factory for the plain JSON job shape.
pub struct JsonJobFactory;

#[async_trait]
impl JobFactory for JsonJobFactory {
    fn from_value(&self, value: Value) -> Result<Job> {
        serde_json::from_value(value)
            .map_err(|e| WorkerError::protocol(format!("malformed job object: {e}")))
    }

    async fn from_file(&self, path: &Path) -> Result<Job> {
        let raw = tokio::fs::read_to_string(path).await?;
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| WorkerError::config(format!("invalid job file {}: {e}", path.display())))?;
        self.from_value(value)
    }
}

enum Source {
    File { path: PathBuf, consumed: bool },
    Tracker {
        client: TrackerClient,
        vpid: String,
        job_type: String,
    },
}

/// "Get the next job", regardless of where jobs come from.
pub struct JobSource {
    source: Source,
    factory: Arc<dyn JobFactory>,
}

impl JobSource {
    /// Source that yields the file's job exactly once, then nothing
    pub fn single_file(path: PathBuf, factory: Arc<dyn JobFactory>) -> Self {
        Self {
            source: Source::File {
                path,
                consumed: false,
            },
            factory,
        }
    }

    /// Source that checks jobs out of the tracker
    pub fn tracker(
        client: TrackerClient,
        vpid: impl Into<String>,
        job_type: impl Into<String>,
        factory: Arc<dyn JobFactory>,
    ) -> Self {
        Self {
            source: Source::Tracker {
                client,
                vpid: vpid.into(),
                job_type: job_type.into(),
            },
            factory,
        }
    }

    /// Obtain the next job, blocking for at most one checkout round trip.
    pub async fn next(&mut self) -> Result<Option<Job>> {
        let factory = Arc::clone(&self.factory);
        match &mut self.source {
            Source::File { path, consumed } => {
                if *consumed {
                    return Ok(None);
                }
                *consumed = true;
                let job = factory.from_file(path).await?;
                debug!(job_id = %job.id, "loaded single job file");
                Ok(Some(job))
            }
            Source::Tracker {
                client,
                vpid,
                job_type,
            } => {
                let Some(value) = client.checkout(vpid, job_type).await? else {
                    return Ok(None);
                };
                match factory.from_value(value) {
                    Ok(job) => Ok(Some(job)),
                    Err(error) => {
                        // same recovery as any other bad reply: skip this round
                        warn!(%error, "discarding unparsable job");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Best-effort outbound signal to the foreman (no-op for file sources).
    pub async fn signal(&mut self, message: Value) {
        if let Source::Tracker { client, .. } = &mut self.source {
            client.signal(message).await;
        }
    }

    /// Tear down tracker sockets, swallowing errors (no-op for file sources).
    pub async fn shutdown(&mut self) {
        if let Source::Tracker { client, .. } = &mut self.source {
            client.shutdown().await;
        }
    }
}
