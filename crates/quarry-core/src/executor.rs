// Job executor seam
// Decision: object-safe trait with Send + Sync bounds so one executor instance
// can be shared with the runtime behind an Arc

use async_trait::async_trait;

use quarry_contracts::Job;

use crate::error::JobError;
use crate::status::StatusChannel;

/// The external collaborator that performs the actual extraction/transform
/// work for one job.
///
/// The runtime treats `run` as entirely opaque: it may block for arbitrarily
/// long domain-specific work. [`JobError`] is the only failure the runtime
/// catches around it; either an `Err` or an `Ok(false)` is fatal to the
/// worker process; recovery belongs to whatever respawns it.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Execute one job; `Ok(true)` means the job succeeded.
    ///
    /// `status` is the worker's one status channel, lent for the duration of
    /// the job so extraction code can report `percent`/`status` progress.
    async fn run(
        &self,
        job: &Job,
        status: &mut StatusChannel,
    ) -> std::result::Result<bool, JobError>;

    /// Hook for commands other than `stop` arriving on the command channel.
    /// Return `true` if the command was handled.
    async fn on_command(&self, _command: &str) -> bool {
        false
    }

    /// Hook invoked during teardown, after the STOPPING frame. Best-effort;
    /// the runtime discards anything it does wrong.
    async fn on_shutdown(&self) {}
}
