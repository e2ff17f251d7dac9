//! Form session aggregate.
//!
//! `FormSession` owns everything one form needs: the compiled schema (inside
//! the store), values, errors, the dirty flag, the interaction counter, the
//! submission controller and the load phase.
//!
//! All operations are synchronous. Side effects are not performed here; each
//! operation returns the [`Effect`]s the driver (see `runtime`) has to carry
//! out. Results of those effects come back through `apply_config` and
//! `on_submit_result`.

use tracing::{debug, info, warn};

use crate::errors::{FormError, ServiceError};
use crate::field::{FieldDescriptor, check_unique_names};
use crate::schema::compile_with;
use crate::service::SubmitReceipt;
use crate::settings::EngineSettings;
use crate::store::FormStore;
use crate::submission::{Resolution, SubmissionController, SubmissionState, Ticket};
use crate::value::{FieldValue, FormValues};
use crate::view::{FieldView, FormView, SessionPhase};

/// Correlates a config fetch with its response; bumped on every (re)load.
pub type LoadGeneration = u64;

/// Declarative side effect requested by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call `fetch_field_config` and feed the result to `apply_config`.
    FetchConfig { generation: LoadGeneration },
    /// (Re)arm the autosave debounce timer.
    ScheduleAutosave,
    /// Drop the pending autosave timer, if any.
    CancelAutosave,
    /// Fire-and-forget autosave of this snapshot.
    Autosave(FormValues),
    /// Call `submit_form` and feed the result to `on_submit_result`.
    Submit { ticket: Ticket, values: FormValues },
}

#[derive(Debug, Clone)]
pub struct FormSession {
    settings: EngineSettings,
    phase: SessionPhase,
    store: FormStore,
    submission: SubmissionController,
    generation: LoadGeneration,
}

impl FormSession {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            phase: SessionPhase::Loading,
            store: FormStore::default(),
            submission: SubmissionController::new(),
            generation: 0,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn store(&self) -> &FormStore {
        &self.store
    }

    pub fn submission(&self) -> &SubmissionState {
        self.submission.state()
    }

    /// Start (or restart) fetching the descriptor list. Any previous form
    /// state is discarded.
    pub fn begin_load(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.phase = SessionPhase::Loading;
        self.store = FormStore::default();
        self.submission.reset();
        debug!(generation = self.generation, "loading form configuration");
        vec![
            Effect::CancelAutosave,
            Effect::FetchConfig {
                generation: self.generation,
            },
        ]
    }

    /// Install the fetched descriptors. Responses for an older load are
    /// ignored.
    pub fn apply_config(
        &mut self,
        generation: LoadGeneration,
        result: Result<Vec<FieldDescriptor>, ServiceError>,
    ) -> Vec<Effect> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "ignoring stale config response");
            return Vec::new();
        }

        let descriptors = result.map_err(|e| e.to_string()).and_then(|descriptors| {
            check_unique_names(&descriptors)
                .map(|_| descriptors)
                .map_err(|e| e.to_string())
        });

        match descriptors {
            Ok(descriptors) => {
                let schema = compile_with(&descriptors, &self.settings);
                info!(fields = schema.len(), "form configuration loaded");
                self.store = FormStore::new(schema);
                self.phase = SessionPhase::Ready;
            }
            Err(reason) => {
                warn!(%reason, "failed to load form configuration");
                self.phase = SessionPhase::LoadFailed(reason);
            }
        }
        Vec::new()
    }

    /// One user edit.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Vec<Effect>, FormError> {
        self.ensure_ready()?;
        self.store.set_value(name, value)?;
        Ok(if self.settings.autosave_enabled {
            vec![Effect::ScheduleAutosave]
        } else {
            Vec::new()
        })
    }

    /// Validate everything and, if the form is clean, move to `Optimistic`.
    ///
    /// A validation failure leaves the submission state untouched and the
    /// per-field errors in the store.
    pub fn submit(&mut self) -> Result<Vec<Effect>, FormError> {
        self.ensure_ready()?;
        self.submission.ensure_can_submit()?;

        let count = self.store.validate_all();
        if count > 0 {
            debug!(count, "submit blocked by validation errors");
            return Err(FormError::ValidationFailed { count });
        }

        let ticket = self.submission.begin()?;
        info!(ticket, "submitting form");
        Ok(vec![Effect::Submit {
            ticket,
            values: self.store.snapshot(),
        }])
    }

    pub fn on_submit_result(
        &mut self,
        ticket: Ticket,
        result: Result<SubmitReceipt, ServiceError>,
    ) -> Resolution {
        let resolution = match result {
            Ok(receipt) => {
                info!(ticket, id = %receipt.id, "submission confirmed");
                self.submission.confirm(ticket, receipt.id)
            }
            Err(err) => {
                warn!(ticket, error = %err, "submission failed");
                self.submission.fail(ticket, err.to_string())
            }
        };
        if resolution == Resolution::Stale {
            debug!(ticket, "ignoring stale submit response");
        }
        resolution
    }

    /// Back to defaults: values, errors, counter, dirty flag and submission.
    pub fn reset(&mut self) -> Vec<Effect> {
        self.store.reset();
        self.submission.reset();
        debug!("form reset");
        vec![Effect::CancelAutosave]
    }

    /// The debounce timer fired: autosave the current snapshot.
    pub fn autosave_due(&self) -> Vec<Effect> {
        if self.phase != SessionPhase::Ready || !self.settings.autosave_enabled {
            return Vec::new();
        }
        vec![Effect::Autosave(self.store.snapshot())]
    }

    pub fn view(&self) -> FormView {
        let submission = self.submission.state().clone();
        let fields = if self.phase == SessionPhase::Ready {
            self.store
                .schema()
                .fields()
                .iter()
                .chain(self.store.visibility().fields())
                .map(|spec| FieldView {
                    spec: spec.clone(),
                    value: self.store.value(&spec.name).cloned(),
                    error: self.store.errors().get(&spec.name).map(str::to_string),
                })
                .collect()
        } else {
            Vec::new()
        };

        FormView {
            phase: self.phase.clone(),
            fields,
            values: self.store.values().clone(),
            errors: self.store.errors().clone(),
            submit_label: submission.label(),
            submit_enabled: self.phase == SessionPhase::Ready && self.submission.submit_enabled(),
            submission,
            interactions: self.store.interactions(),
            dirty: self.store.is_dirty(),
        }
    }

    fn ensure_ready(&self) -> Result<(), FormError> {
        match self.phase {
            SessionPhase::Ready => Ok(()),
            _ => Err(FormError::NotReady),
        }
    }
}
