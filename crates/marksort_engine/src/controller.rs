use marksort_core::{update, Effect, Msg, OrganizerState, ProgressState, RunId, RunRequest};
use marksort_logging::{mark_info, mark_warn};

use crate::{EngineEvent, EngineHandle, OrganizeError, RunEnd, RunOutcome};

/// The control boundary polled by a presentation layer: `start`, `cancel`,
/// `reset` are fire-and-forget, `get_progress` returns a snapshot.
///
/// Owns the progress state; engine events are folded in whenever the state
/// is read.
pub struct Controller {
    state: OrganizerState,
    engine: EngineHandle,
    last_outcome: Option<RunOutcome>,
    /// Dispatched run whose `RunFinished` has not arrived yet. Outlives the
    /// progress state's view of the run after a cancel.
    in_flight: Option<RunId>,
}

impl Controller {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            state: OrganizerState::new(),
            engine,
            last_outcome: None,
            in_flight: None,
        }
    }

    /// Returns whether a new run was dispatched. Refused while any earlier
    /// run is still executing, including one already shown as cancelled,
    /// so two pipelines never mutate the store at once.
    pub fn start(&mut self, request: RunRequest) -> bool {
        self.drain_events();
        if let Some(run_id) = self.in_flight {
            mark_warn!("Run {} has not stopped yet; start ignored", run_id);
            return false;
        }
        self.dispatch(Msg::StartRequested(request));
        let started = self.in_flight.is_some();
        if started {
            self.last_outcome = None;
        }
        started
    }

    pub fn cancel(&mut self) {
        self.dispatch(Msg::CancelRequested);
    }

    pub fn reset(&mut self) {
        self.drain_events();
        self.dispatch(Msg::ResetRequested);
    }

    pub fn get_progress(&mut self) -> ProgressState {
        self.drain_events();
        self.state.snapshot()
    }

    /// Details of the last completed run: backup warnings and plan coverage.
    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    /// True until the engine has reported the end of the last started run,
    /// even when the progress state already shows it cancelled.
    pub fn run_in_flight(&mut self) -> bool {
        self.drain_events();
        self.in_flight.is_some()
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.engine.try_recv() {
            let msg = self.event_to_msg(event);
            self.dispatch(msg);
        }
    }

    fn event_to_msg(&mut self, event: EngineEvent) -> Msg {
        match event {
            EngineEvent::Progress {
                run_id,
                percent,
                text,
            } => Msg::Progress {
                run_id,
                percent,
                text,
            },
            EngineEvent::RunFinished { run_id, result } => {
                if self.in_flight == Some(run_id) {
                    self.in_flight = None;
                }
                self.finished_to_msg(run_id, result)
            }
        }
    }

    fn finished_to_msg(&mut self, run_id: RunId, result: Result<RunEnd, OrganizeError>) -> Msg {
        match result {
            Ok(RunEnd::Completed(outcome)) => {
                for warning in &outcome.warnings {
                    mark_warn!("Run {}: {}", run_id, warning);
                }
                let summary = outcome.summary;
                if self.state.current_run() == Some(run_id) {
                    self.last_outcome = Some(outcome);
                }
                Msg::RunCompleted { run_id, summary }
            }
            Ok(RunEnd::Cancelled { stage }) => {
                mark_info!("Run {} stopped before {:?}", run_id, stage);
                Msg::RunCancelled { run_id }
            }
            Err(err) => Msg::RunFailed {
                run_id,
                message: err.to_string(),
            },
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            match effect {
                Effect::StartRun { run_id, request } => {
                    self.in_flight = Some(run_id);
                    self.engine.start(run_id, request);
                }
                Effect::CancelRun { run_id } => self.engine.cancel(run_id),
            }
        }
    }
}
