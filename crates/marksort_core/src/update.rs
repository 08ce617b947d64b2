use crate::{Effect, Msg, OrganizerState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: OrganizerState, msg: Msg) -> (OrganizerState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested(request) => {
            // One run at a time; a second start while running is dropped.
            if state.is_running() {
                return (state, Vec::new());
            }
            let run_id = state.begin_run();
            vec![Effect::StartRun { run_id, request }]
        }
        Msg::CancelRequested => match state.current_run() {
            Some(run_id) if state.is_running() => {
                state.mark_cancelled();
                vec![Effect::CancelRun { run_id }]
            }
            _ => Vec::new(),
        },
        Msg::ResetRequested => {
            if !state.is_running() {
                state.reset();
            }
            Vec::new()
        }
        Msg::Progress {
            run_id,
            percent,
            text,
        } => {
            if state.accepts(run_id) {
                state.apply_progress(percent, text);
            }
            Vec::new()
        }
        Msg::RunCompleted { run_id, summary } => {
            if state.accepts(run_id) {
                state.mark_done(summary);
            }
            Vec::new()
        }
        Msg::RunFailed { run_id, message } => {
            if state.accepts(run_id) {
                state.mark_failed(message);
            }
            Vec::new()
        }
        Msg::RunCancelled { run_id } => {
            if state.accepts(run_id) {
                state.mark_cancelled();
            }
            Vec::new()
        }
    };

    (state, effects)
}
