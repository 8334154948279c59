use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::error::AppError;
use crate::models::FinalOutput;
use crate::services::pipeline::analyze_workbook;

#[derive(Debug)]
pub struct AnalysisJob {
    pub id: Uuid,
    pub file_name: String,
    pub buffer: Bytes,
}

#[derive(Debug)]
pub enum JobOutcome {
    Completed { id: Uuid, output: FinalOutput },
    Failed { id: Uuid, file_name: String, error: String },
}

impl JobOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            JobOutcome::Completed { id, .. } | JobOutcome::Failed { id, .. } => *id,
        }
    }
}

/// Handle for submitting workbooks to the background analysis worker.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<AnalysisJob>,
}

impl JobQueue {
    /// Spawns the worker. At most `concurrency` analyses run at once; every
    /// finished job is reported on the returned receiver.
    pub fn start(
        concurrency: usize,
        config: AnalysisConfig,
    ) -> (Self, mpsc::UnboundedReceiver<JobOutcome>) {
        let (sender, jobs) = mpsc::unbounded_channel();
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let permits = Arc::new(Semaphore::new(concurrency.max(1)));

        tokio::spawn(dispatch(jobs, outcomes, permits, config));
        info!("Analysis worker started with concurrency {}", concurrency.max(1));

        (Self { sender }, receiver)
    }

    /// Queues a workbook and returns its job id without waiting for the analysis.
    pub fn enqueue(&self, file_name: String, buffer: Bytes) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.sender
            .send(AnalysisJob { id, file_name, buffer })
            .map_err(|_| AppError::QueueClosed)?;
        info!("Job {} added to the queue", id);
        Ok(id)
    }
}

async fn dispatch(
    mut jobs: mpsc::UnboundedReceiver<AnalysisJob>,
    outcomes: mpsc::UnboundedSender<JobOutcome>,
    permits: Arc<Semaphore>,
    config: AnalysisConfig,
) {
    while let Some(job) = jobs.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            warn!("Worker semaphore closed, dropping job {}", job.id);
            break;
        };

        let outcomes = outcomes.clone();
        tokio::spawn(async move {
            let outcome = run_job(job, config).await;
            drop(permit);
            if outcomes.send(outcome).is_err() {
                warn!("Job outcome receiver dropped");
            }
        });
    }
    info!("Analysis queue closed, worker stopping");
}

async fn run_job(job: AnalysisJob, config: AnalysisConfig) -> JobOutcome {
    let AnalysisJob { id, file_name, buffer } = job;
    info!("Starting with the processing of job {} for file {}", id, file_name);

    let name = file_name.clone();
    let result =
        tokio::task::spawn_blocking(move || analyze_workbook(&buffer, &name, &config)).await;

    match result {
        Ok(Ok(output)) => JobOutcome::Completed { id, output },
        Ok(Err(e)) => JobOutcome::Failed { id, file_name, error: e.to_string() },
        Err(e) => JobOutcome::Failed {
            id,
            file_name,
            error: AppError::Internal(format!("analysis task aborted: {}", e)).to_string(),
        },
    }
}

/// Completion/failure listener: drains outcomes into the log.
pub async fn log_outcomes(mut outcomes: mpsc::UnboundedReceiver<JobOutcome>) {
    while let Some(outcome) = outcomes.recv().await {
        match outcome {
            JobOutcome::Completed { id, output } => info!(
                "Job {} for file {} has been completed successfully. Result has {} sheets.",
                id,
                output.file_name,
                output.sheets.len()
            ),
            JobOutcome::Failed { id, file_name, error } => {
                error!("Job {} for file {} has failed with error: {}", id, file_name, error)
            }
        }
    }
}
