use thiserror::Error;

/// Failure of one of the external collaborator calls
/// (config fetch, submit, autosave).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status: {code}")]
    Status { code: u16 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Why a submit request was turned away before any validation ran.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("a submission is already in flight")]
    InFlight,

    #[error("form already submitted; reset before submitting again")]
    AlreadyConfirmed,
}

/// Local rejection of a form operation. Never fatal to the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field is disabled: {0}")]
    FieldDisabled(String),

    #[error("field is hidden: {0}")]
    FieldHidden(String),

    #[error("field {name} has an unsupported variant: {variant}")]
    UnsupportedVariant { name: String, variant: String },

    #[error("invalid option for {name}: {value}")]
    InvalidOption { name: String, value: String },

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("form is not ready")]
    NotReady,

    #[error("validation failed for {count} field(s)")]
    ValidationFailed { count: usize },

    #[error("submit rejected: {0}")]
    SubmitRejected(#[from] SubmitRejected),

    #[error("form runtime has shut down")]
    ChannelClosed,
}
