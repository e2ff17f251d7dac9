//! Submission controller.
//!
//! Explicit four-state machine around a single in-flight submission:
//!
//! ```text
//!   Idle ──submit──▶ Optimistic ──ok──▶ Confirmed(id) ──reset──▶ Idle
//!    ▲                   │
//!    │                  err
//!    │                   ▼
//!    └────(submit)──── Failed
//! ```
//!
//! Each accepted submit gets a fresh [`Ticket`]. Responses are matched
//! against the ticket of the current `Optimistic` state; anything else
//! (a reset happened in between, or the form was torn down) is stale and
//! ignored.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::SubmitRejected;

/// Correlates a submit request with its response.
pub type Ticket = u64;

/// Identifier returned by the submit operation, kept verbatim.
///
/// The wire value may be a number or a string; both are stored as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SubmissionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => SubmissionId(n.to_string()),
            Raw::Text(s) => SubmissionId(s),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Optimistic { ticket: Ticket },
    Confirmed(SubmissionId),
    Failed { reason: String },
}

impl SubmissionState {
    /// Text for the submit button / status line.
    pub fn label(&self) -> String {
        match self {
            SubmissionState::Idle => "Submit".to_string(),
            SubmissionState::Optimistic { .. } => "Submitted, awaiting confirmation".to_string(),
            SubmissionState::Confirmed(id) => {
                format!("Form submitted successfully! Submission ID: {id}")
            }
            SubmissionState::Failed { .. } => "Submission failed, please try again".to_string(),
        }
    }
}

/// Outcome of feeding a response into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

#[derive(Debug, Clone)]
pub struct SubmissionController {
    state: SubmissionState,
    next_ticket: Ticket,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// False while a submission is in flight or already confirmed; this is
    /// the "submit disabled" signal for the UI.
    pub fn submit_enabled(&self) -> bool {
        matches!(
            self.state,
            SubmissionState::Idle | SubmissionState::Failed { .. }
        )
    }

    /// Check whether a submit may start, before validation runs.
    pub fn ensure_can_submit(&self) -> Result<(), SubmitRejected> {
        match self.state {
            SubmissionState::Optimistic { .. } => Err(SubmitRejected::InFlight),
            SubmissionState::Confirmed(_) => Err(SubmitRejected::AlreadyConfirmed),
            SubmissionState::Idle | SubmissionState::Failed { .. } => Ok(()),
        }
    }

    /// Enter `Optimistic`. Call only after the values validated.
    pub fn begin(&mut self) -> Result<Ticket, SubmitRejected> {
        self.ensure_can_submit()?;
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.state = SubmissionState::Optimistic { ticket };
        Ok(ticket)
    }

    pub fn confirm(&mut self, ticket: Ticket, id: SubmissionId) -> Resolution {
        if !self.is_current(ticket) {
            return Resolution::Stale;
        }
        self.state = SubmissionState::Confirmed(id);
        Resolution::Applied
    }

    pub fn fail(&mut self, ticket: Ticket, reason: impl Into<String>) -> Resolution {
        if !self.is_current(ticket) {
            return Resolution::Stale;
        }
        self.state = SubmissionState::Failed {
            reason: reason.into(),
        };
        Resolution::Applied
    }

    /// Back to `Idle` from any state. An in-flight ticket becomes stale.
    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        matches!(self.state, SubmissionState::Optimistic { ticket: t } if t == ticket)
    }
}
