// Worker runtime
// Decision: single task, synchronous loop: "concurrency" is interleaved
// blocking points (checkout round trip, executor call), never parallelism
// Decision: teardown is unconditional; it runs on every exit path and
// swallows its own errors so the original exit reason is never masked

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{error, info, warn};

use quarry_contracts::{Job, WorkerState};

use crate::command::CommandChannel;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::executor::JobExecutor;
use crate::identity;
use crate::source::JobSource;
use crate::status::StatusChannel;

/// Loop state; transitions one way, Running → Stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopping,
}

/// The process loop every worker shares: job checkout, execution dispatch,
/// inactivity timeout, command handling, graceful shutdown.
///
/// Exactly one job is in flight at a time. A `stop` command is cooperative:
/// it is checked once per iteration and never interrupts a running job, it
/// only prevents starting the next one.
pub struct WorkerRuntime {
    config: WorkerConfig,
    source: JobSource,
    status: StatusChannel,
    commands: CommandChannel,
    executor: Arc<dyn JobExecutor>,
    state: RunState,
    jobs_processed: u32,
}

impl WorkerRuntime {
    pub fn new(
        config: WorkerConfig,
        source: JobSource,
        status: StatusChannel,
        commands: CommandChannel,
        executor: Arc<dyn JobExecutor>,
    ) -> Self {
        Self {
            config,
            source,
            status,
            commands,
            executor,
            state: RunState::Running,
            jobs_processed: 0,
        }
    }

    /// Jobs completed successfully so far
    pub fn jobs_processed(&self) -> u32 {
        self.jobs_processed
    }

    /// Run until stop command, inactivity timeout, max-job recycle, or fatal
    /// job failure. `Ok` maps to exit code 0, `Err` to a non-zero exit.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.run_loop().await;
        self.teardown().await;
        result
    }

    async fn run_loop(&mut self) -> Result<()> {
        self.status.identity(identity::vpid())?;
        info!(vpid = identity::vpid(), job_type = %self.config.job_type, "worker running");

        // The inactivity clock starts at loop entry and resets only when a
        // checkout yields a job.
        let mut last_started = Instant::now();

        while self.state == RunState::Running {
            match self.source.next().await? {
                None => {
                    self.status.state(WorkerState::Idle, None)?;
                    let idle = last_started.elapsed();
                    if idle >= self.config.idle_timeout {
                        info!(
                            idle_secs = idle.as_secs(),
                            "no work within the inactivity window, shutting down"
                        );
                        break;
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Some(job) => {
                    last_started = Instant::now();
                    if !self.execute(&job).await? {
                        return Err(WorkerError::job_execution(
                            job.id,
                            "executor reported failure",
                        ));
                    }
                    self.jobs_processed += 1;
                    if let Some(max) = self.config.max_jobs {
                        if self.jobs_processed >= max {
                            info!(jobs = self.jobs_processed, "max job count reached, recycling");
                            break;
                        }
                    }
                }
            }
            self.poll_command().await;
        }
        Ok(())
    }

    /// Dispatch one job and report its terminal state.
    async fn execute(&mut self, job: &Job) -> Result<bool> {
        info!(job_id = %job.id, description = %job.description, "job started");
        let description = (!job.description.is_empty()).then_some(job.description.as_str());
        self.status.job_started(&job.id, job.timeout, description)?;

        let executor = Arc::clone(&self.executor);
        match executor.run(job, &mut self.status).await {
            Ok(true) => {
                self.status.state(WorkerState::Success, None)?;
                Ok(true)
            }
            Ok(false) => {
                error!(job_id = %job.id, "executor reported failure");
                self.status.state(WorkerState::Failed, None)?;
                Ok(false)
            }
            Err(job_error) => {
                error!(job_id = %job.id, error = %job_error, "executor raised");
                self.status
                    .state(WorkerState::Failed, Some(&job_error.to_string()))?;
                Ok(false)
            }
        }
    }

    /// One command poll per loop iteration; never blocks.
    async fn poll_command(&mut self) {
        let Some(command) = self.commands.try_read() else {
            return;
        };
        match command.as_str() {
            "stop" => {
                info!("stop command received");
                self.state = RunState::Stopping;
            }
            other => {
                if !self.executor.on_command(other).await {
                    warn!(command = %other, "unhandled command");
                }
            }
        }
    }

    /// Unconditional teardown: STOPPING frame, shutdown hook, command channel
    /// close, tracker socket teardown, in that order, errors swallowed.
    async fn teardown(&mut self) {
        if let Err(write_error) = self.status.state(WorkerState::Stopping, None) {
            warn!(error = %write_error, "could not report STOPPING");
        }
        self.executor.on_shutdown().await;
        self.commands.close();
        self.source
            .signal(json!({"bye": {"vpid": identity::vpid()}}))
            .await;
        self.source.shutdown().await;
        info!(jobs = self.jobs_processed, "worker stopped");
    }
}
