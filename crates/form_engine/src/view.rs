//! Read-only snapshot of a form session for rendering.

use crate::field::FieldSpec;
use crate::store::FieldErrors;
use crate::submission::SubmissionState;
use crate::value::{FieldValue, FormValues};

/// Lifecycle of the descriptor fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Loading,
    Ready,
    /// The descriptor list could not be obtained or was invalid.
    LoadFailed(String),
}

/// One renderable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub spec: FieldSpec,
    pub value: Option<FieldValue>,
    pub error: Option<String>,
}

/// Everything a front end needs to draw the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormView {
    pub phase: SessionPhase,
    /// Schema fields in render order followed by visible conditional fields.
    pub fields: Vec<FieldView>,
    pub values: FormValues,
    pub errors: FieldErrors,
    pub submission: SubmissionState,
    pub submit_label: String,
    pub submit_enabled: bool,
    pub interactions: u64,
    pub dirty: bool,
}

impl FormView {
    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.spec.name == name)
    }
}
