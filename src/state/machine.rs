use super::error::{StateError, StateResult};
use super::{event::StateTransition, SessionEvent, SessionMode};

#[derive(Debug)]
pub struct StateMachine {
    mode: SessionMode,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            mode: SessionMode::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_mode(event).is_some()
    }

    pub fn next_mode(&self, event: SessionEvent) -> Option<SessionMode> {
        use SessionEvent::*;
        match (self.mode, event) {
            (SessionMode::Editing, StartCrop) => Some(SessionMode::Cropping),
            (SessionMode::Cropping, StopCrop) => Some(SessionMode::Editing),
            (SessionMode::Editing, BeginTextEdit) => Some(SessionMode::TextEditing),
            (SessionMode::TextEditing, EndTextEdit) => Some(SessionMode::Editing),
            (SessionMode::Editing | SessionMode::Cropping | SessionMode::TextEditing, Close) => {
                Some(SessionMode::Closed)
            }
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionMode> {
        tracing::debug!(from = ?self.mode, event = ?event, "request mode transition");
        let next = self.next_mode(event).ok_or_else(|| {
            let from = self.mode;
            tracing::warn!(from = ?from, event = ?event, "invalid mode transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(self.mode, event, next);
        self.mode = next;
        self.transition_history.push(record);

        Ok(self.mode)
    }
}

#[cfg(test)]
impl StateMachine {
    fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionMode::{:?}", self.mode)
    }
}
