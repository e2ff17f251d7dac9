//! Scripted in-process [`FormService`].
//!
//! Returns canned descriptors, answers submits with increasing ids (or with
//! queued responses) and records every call it receives. Used by the test
//! suites and by `scribe run --offline`.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::debug;

use super::{FormService, SubmitReceipt};
use crate::errors::ServiceError;
use crate::field::FieldDescriptor;
use crate::submission::SubmissionId;
use crate::value::FormValues;

#[derive(Debug)]
pub struct InMemoryFormService {
    descriptors: Mutex<Result<Vec<FieldDescriptor>, ServiceError>>,
    submit_script: Mutex<VecDeque<Result<SubmitReceipt, ServiceError>>>,
    autosave_error: Mutex<Option<ServiceError>>,
    latency: Duration,
    next_id: AtomicU64,
    fetches: AtomicUsize,
    submits: Mutex<Vec<FormValues>>,
    autosaves: Mutex<Vec<FormValues>>,
}

impl InMemoryFormService {
    pub fn new(descriptors: Vec<FieldDescriptor>) -> Self {
        Self {
            descriptors: Mutex::new(Ok(descriptors)),
            submit_script: Mutex::new(VecDeque::new()),
            autosave_error: Mutex::new(None),
            latency: Duration::ZERO,
            next_id: AtomicU64::new(101),
            fetches: AtomicUsize::new(0),
            submits: Mutex::new(Vec::new()),
            autosaves: Mutex::new(Vec::new()),
        }
    }

    /// Service whose config fetch always fails with `error`.
    pub fn failing(error: ServiceError) -> Self {
        let service = Self::new(Vec::new());
        service.set_descriptors(Err(error));
        service
    }

    /// The three-field demo form (name, age, terms).
    pub fn demo() -> Self {
        Self::new(demo_descriptors())
    }

    /// Delay applied to every submit and autosave call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_descriptors(&self, descriptors: Result<Vec<FieldDescriptor>, ServiceError>) {
        if let Ok(mut slot) = self.descriptors.lock() {
            *slot = descriptors;
        }
    }

    /// Queue the response for the next submit. Unscripted submits succeed.
    pub fn push_submit_response(&self, response: Result<SubmitReceipt, ServiceError>) {
        if let Ok(mut script) = self.submit_script.lock() {
            script.push_back(response);
        }
    }

    pub fn fail_autosaves(&self, error: Option<ServiceError>) {
        if let Ok(mut slot) = self.autosave_error.lock() {
            *slot = error;
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<FormValues> {
        self.submits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn autosaved(&self) -> Vec<FormValues> {
        self.autosaves.lock().map(|v| v.clone()).unwrap_or_default()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait::async_trait]
impl FormService for InMemoryFormService {
    async fn fetch_field_config(&self) -> Result<Vec<FieldDescriptor>, ServiceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.descriptors
            .lock()
            .map_err(|_| ServiceError::Unavailable("descriptor store poisoned".into()))?
            .clone()
    }

    async fn submit_form(&self, values: FormValues) -> Result<SubmitReceipt, ServiceError> {
        debug!(fields = values.len(), "in-memory submit");
        if let Ok(mut submits) = self.submits.lock() {
            submits.push(values);
        }
        self.simulate_latency().await;

        let scripted = self
            .submit_script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(SubmitReceipt {
                id: SubmissionId::new(id.to_string()),
            })
        })
    }

    async fn autosave(&self, values: FormValues) -> Result<FormValues, ServiceError> {
        if let Ok(mut autosaves) = self.autosaves.lock() {
            autosaves.push(values.clone());
        }
        self.simulate_latency().await;

        let error = self.autosave_error.lock().ok().and_then(|e| e.clone());
        match error {
            Some(error) => Err(error),
            None => Ok(values),
        }
    }
}

/// Descriptors of the demo form served by the offline service.
pub fn demo_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("name_8066616423", "Name")
            .required(true)
            .placeholder("Enter your name"),
        FieldDescriptor::number("age_12345", "Age")
            .required(true)
            .placeholder("Enter your age"),
        FieldDescriptor::checkbox("terms_001", "Agree to terms")
            .required(true)
            .checked(false),
    ]
}
