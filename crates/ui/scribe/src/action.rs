use form_engine::FieldValue;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display, Deserialize)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Quit,
    Update,
    Error(String),
    /// Commit an edited value to the form runtime.
    SetValue { name: String, value: FieldValue },
    Submit,
    Reset,
    /// Fetch the field configuration again.
    Reload,
}
