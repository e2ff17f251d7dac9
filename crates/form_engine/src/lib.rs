//! Dynamic form engine.
//!
//! Turns a field descriptor list fetched at runtime into a validation
//! schema, a conditionally rendered field set, a debounced autosave pipeline
//! and an optimistic submission state machine.
//!
//! Layers, leaf first:
//! - `field`, `value`: data model
//! - `schema`: descriptor list -> rules, defaults and render order
//! - `store`: values, errors, dirty flag, interaction counter
//! - `visibility`: derived conditional fields
//! - `scheduler`: cancellable timers and the autosave debouncer
//! - `submission`: four-state submit controller
//! - `session`: synchronous aggregate returning effects
//! - `runtime`: async driver talking to a [`FormService`]

pub mod errors;
pub mod field;
pub mod runtime;
pub mod scheduler;
pub mod schema;
pub mod service;
pub mod session;
pub mod settings;
pub mod store;
pub mod submission;
pub mod value;
pub mod view;
pub mod visibility;

pub use errors::{FormError, ServiceError, SubmitRejected};
pub use field::{FieldDescriptor, FieldKind, FieldSpec, FieldType, FieldVariant};
pub use runtime::{FormHandle, FormRuntime};
pub use schema::{FormSchema, ValidationRule, compile, compile_with};
pub use service::{FormService, SubmitReceipt};
pub use session::{Effect, FormSession};
pub use settings::EngineSettings;
pub use submission::{SubmissionId, SubmissionState};
pub use value::{FieldValue, FormValues, Numeric};
pub use view::{FieldView, FormView, SessionPhase};
