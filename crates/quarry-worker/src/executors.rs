// Built-in executors
//
// Real extraction executors (spatial databases, web services, file systems)
// live in their own crates and register through the ExecutorRegistry; the
// only executor shipped here is the pipeline smoke tester.

use async_trait::async_trait;
use tracing::info;

use quarry_contracts::Job;
use quarry_core::{JobError, JobExecutor, StatusChannel};

/// Executor that performs no extraction work.
///
/// Used to smoke-test a deployment end to end: checkout, dispatch, status
/// frames and teardown all run for real, only the work is skipped. A payload
/// of `{"fail": true}` makes it report failure, which exercises the fatal
/// path on demand.
pub struct NoopExecutor;

#[async_trait]
impl JobExecutor for NoopExecutor {
    async fn run(&self, job: &Job, status: &mut StatusChannel) -> Result<bool, JobError> {
        info!(job_id = %job.id, "noop executor ran");
        status
            .percent(1.0, "noop complete", "noop")
            .map_err(|e| JobError::extraction(e.to_string()))?;
        let fail = job
            .payload
            .get("fail")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(!fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discard() -> StatusChannel {
        StatusChannel::new(Box::new(std::io::sink()))
    }

    #[tokio::test]
    async fn test_noop_succeeds_by_default() {
        let job = Job::new("j-1", "smoke", 60);
        assert!(NoopExecutor.run(&job, &mut discard()).await.unwrap());
    }

    #[tokio::test]
    async fn test_noop_fails_on_request() {
        let mut job = Job::new("j-1", "smoke", 60);
        job.payload = serde_json::json!({"fail": true});
        assert!(!NoopExecutor.run(&job, &mut discard()).await.unwrap());
    }
}
