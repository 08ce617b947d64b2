use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use marksort_core::{RunId, RunRequest};
use marksort_logging::{mark_error, mark_info};
use tokio::sync::mpsc as tokio_mpsc;
use tokio_util::sync::CancellationToken;

use crate::progress::ChannelProgressSink;
use crate::{EngineEvent, Reorganizer, SetupError};

enum EngineCommand {
    Start {
        run_id: RunId,
        request: RunRequest,
        cancel: CancellationToken,
    },
}

/// Message-passing front for the pipeline. Runs execute on a tokio runtime
/// owned by a worker thread; results and progress come back as
/// `EngineEvent`s. The worker stops once every handle clone is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: tokio_mpsc::UnboundedSender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    active: Arc<Mutex<Option<(RunId, CancellationToken)>>>,
}

impl EngineHandle {
    pub fn new(reorganizer: Reorganizer) -> Result<Self, SetupError> {
        // Single-threaded: every run is one cooperative task on this runtime.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, mut cmd_rx) = tokio_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let reorganizer = Arc::new(reorganizer);

        thread::spawn(move || {
            runtime.block_on(async move {
                while let Some(command) = cmd_rx.recv().await {
                    let reorganizer = reorganizer.clone();
                    let event_tx = event_tx.clone();
                    tokio::spawn(async move {
                        handle_command(reorganizer.as_ref(), command, event_tx).await;
                    });
                }
            });
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            active: Arc::new(Mutex::new(None)),
        })
    }

    pub fn start(&self, run_id: RunId, request: RunRequest) {
        let cancel = CancellationToken::new();
        if let Ok(mut active) = self.active.lock() {
            *active = Some((run_id, cancel.clone()));
        }
        mark_info!("Starting run {} {:?}", run_id, request);
        let _ = self.cmd_tx.send(EngineCommand::Start {
            run_id,
            request,
            cancel,
        });
    }

    /// Signals the run to stop at its next checkpoint. Unknown or finished
    /// runs are ignored.
    pub fn cancel(&self, run_id: RunId) {
        if let Ok(active) = self.active.lock() {
            if let Some((active_id, token)) = active.as_ref() {
                if *active_id == run_id {
                    mark_info!("Cancelling run {}", run_id);
                    token.cancel();
                }
            }
        }
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }
}

async fn handle_command(
    reorganizer: &Reorganizer,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Start {
            run_id,
            request,
            cancel,
        } => {
            let sink = ChannelProgressSink::new(run_id, event_tx.clone());
            let result = reorganizer.run(&request, &cancel, &sink).await;
            if let Err(err) = &result {
                mark_error!("Run {} failed: {}", run_id, err);
            }
            let _ = event_tx.send(EngineEvent::RunFinished { run_id, result });
        }
    }
}
