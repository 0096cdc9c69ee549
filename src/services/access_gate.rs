use std::sync::Arc;

use serde::Serialize;

/// Where a session stands with respect to the password prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    NotSubmitted,
    Rejected,
    /// Terminal for the lifetime of the session.
    Accepted,
}

/// Per-session password gate.
///
/// The submitted value is staged, compared against the configured secret with
/// plain string equality and then dropped, whatever the outcome.
#[derive(Clone)]
pub struct AccessGate {
    secret: Arc<str>,
    submitted: Option<String>,
    state: GateState,
}

impl AccessGate {
    pub fn new(secret: Arc<str>) -> Self {
        Self {
            secret,
            submitted: None,
            state: GateState::NotSubmitted,
        }
    }

    pub fn submit(&mut self, secret: String) -> GateState {
        self.submitted = Some(secret);
        self.check_submitted();
        self.state
    }

    fn check_submitted(&mut self) {
        let Some(candidate) = self.submitted.take() else {
            return;
        };

        if self.state == GateState::Accepted {
            return;
        }

        self.state = if candidate == *self.secret {
            GateState::Accepted
        } else {
            GateState::Rejected
        };
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == GateState::Accepted
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// The staged input, if any. Always `None` once `submit` has returned.
    pub fn submitted_secret(&self) -> Option<&str> {
        self.submitted.as_deref()
    }
}
