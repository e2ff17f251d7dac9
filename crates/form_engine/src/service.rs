//! External collaborator boundary.
//!
//! The engine treats the three network operations as opaque
//! request/response calls behind [`FormService`]. Hosts pick the
//! implementation: `scribe` ships an HTTP one, tests and offline mode use
//! [`memory::InMemoryFormService`].

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::field::FieldDescriptor;
use crate::submission::SubmissionId;
use crate::value::FormValues;

/// Successful submit response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub id: SubmissionId,
}

/// The three operations a form needs from the outside world.
#[async_trait::async_trait]
pub trait FormService: Send + Sync {
    /// Field descriptor list for the form.
    async fn fetch_field_config(&self) -> Result<Vec<FieldDescriptor>, ServiceError>;

    /// Final submission of the current values.
    async fn submit_form(&self, values: FormValues) -> Result<SubmitReceipt, ServiceError>;

    /// Advisory persistence of in-progress values. The response is not
    /// applied to the form.
    async fn autosave(&self, values: FormValues) -> Result<FormValues, ServiceError>;
}
