//! Asynchronous run persistence.
//!
//! The [`RunRecorder`] hands [`NewRun`] jobs to a background task that owns
//! the store, so a compute call returns before its run is written. Each job
//! answers on its own [`PersistTicket`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vspace_core::EngineError;
use vspace_runs::{NewRun, Run, RunStore};

struct Job {
    run: NewRun,
    reply: oneshot::Sender<Result<Run, EngineError>>,
}

/// Handle to the persistence task. Cheap to clone.
#[derive(Clone)]
pub struct RunRecorder {
    tx: mpsc::UnboundedSender<Job>,
}

/// Receiving end of one persistence job. Dropping it is fine.
#[derive(Debug)]
pub struct PersistTicket {
    rx: oneshot::Receiver<Result<Run, EngineError>>,
}

impl PersistTicket {
    /// Waits for the write to finish.
    pub async fn wait(self) -> Result<Run, EngineError> {
        self.rx.await.map_err(|_| {
            EngineError::persistence("runs.recorder", "run recorder stopped before replying")
        })?
    }

    /// Failure the job has already reported, without waiting.
    ///
    /// Only catches writes that failed before the call, such as a stopped
    /// recorder; a pending or successful job yields `None`.
    pub fn settled_error(&mut self) -> Option<EngineError> {
        match self.rx.try_recv() {
            Ok(Err(err)) => Some(err),
            Err(oneshot::error::TryRecvError::Closed) => Some(EngineError::persistence(
                "runs.recorder",
                "run recorder stopped before replying",
            )),
            Ok(Ok(_)) | Err(oneshot::error::TryRecvError::Empty) => None,
        }
    }
}

impl RunRecorder {
    /// Starts the persistence task on the current tokio runtime.
    ///
    /// The task ends once every handle has been dropped and the queue drained.
    pub fn spawn(store: Arc<dyn RunStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let store = Arc::clone(&store);
                let run = job.run;
                let result = tokio::task::spawn_blocking(move || store.create(run))
                    .await
                    .unwrap_or_else(|err| Err(EngineError::persistence("runs.recorder", err)));
                match &result {
                    Ok(run) => debug!(id = %run.id, run_type = %run.run_type, "run recorded"),
                    Err(err) => warn!(error = %err, "failed to record run"),
                }
                let _ = job.reply.send(result);
            }
            debug!("run recorder stopped");
        });
        (Self { tx }, handle)
    }

    /// Queues a run for persistence without waiting for it.
    pub fn record(&self, run: NewRun) -> PersistTicket {
        let (reply, rx) = oneshot::channel();
        if let Err(mpsc::error::SendError(job)) = self.tx.send(Job { run, reply }) {
            warn!("run recorder is not running; dropping run");
            let _ = job.reply.send(Err(EngineError::persistence(
                "runs.recorder",
                "run recorder is not running",
            )));
        }
        PersistTicket { rx }
    }
}
