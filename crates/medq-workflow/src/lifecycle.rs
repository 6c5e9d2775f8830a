//! Event lifecycle shared by clinical records.

use medq_core::EventState;
use medq_core::models::Response;

use crate::error::WorkflowError;

/// State machine capability of a clinical event.
///
/// Implementors expose their state and timestamps; the transitions are
/// provided and refuse to run from the wrong source state.
pub trait EventLifecycle {
    fn state(&self) -> EventState;

    /// Name used in error messages.
    fn event_name(&self) -> String;

    fn apply_state(&mut self, state: EventState, at: jiff::Timestamp);

    fn transition(
        &mut self,
        from: EventState,
        to: EventState,
        at: jiff::Timestamp,
    ) -> Result<(), WorkflowError> {
        if self.state() != from {
            return Err(WorkflowError::InvalidTransition {
                response: self.event_name(),
                from: self.state(),
                to,
            });
        }
        self.apply_state(to, at);
        Ok(())
    }

    fn preparation2in_progress(&mut self, at: jiff::Timestamp) -> Result<(), WorkflowError> {
        self.transition(EventState::Preparation, EventState::InProgress, at)
    }

    fn in_progress2completed(&mut self, at: jiff::Timestamp) -> Result<(), WorkflowError> {
        self.transition(EventState::InProgress, EventState::Completed, at)
    }

    /// Set the state without a source check.
    fn force_state(&mut self, state: EventState, at: jiff::Timestamp) {
        self.apply_state(state, at);
    }
}

impl EventLifecycle for Response {
    fn state(&self) -> EventState {
        self.state
    }

    fn event_name(&self) -> String {
        self.display_name().to_string()
    }

    fn apply_state(&mut self, state: EventState, at: jiff::Timestamp) {
        match state {
            EventState::InProgress => self.occurrence_started_at = Some(at),
            EventState::Completed => self.occurrence_completed_at = Some(at),
            EventState::Preparation => self.occurrence_completed_at = None,
            _ => {}
        }
        self.state = state;
        self.updated_at = at;
    }
}
