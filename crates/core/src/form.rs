//! The render request submitted by the acceptance layer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::preset::TextKind;

/// Field values for one invitation.
///
/// Every field is literal text: nothing is parsed as a date or time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationForm {
    /// Name of the preset to render.
    #[serde(rename = "type")]
    pub preset: String,
    pub date: String,
    pub time: String,
    pub address: String,
    /// Recipient address.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl InvitationForm {
    /// The text drawn for a given layout slot.
    pub fn text_for(&self, kind: TextKind) -> &str {
        match kind {
            TextKind::Date => &self.date,
            TextKind::Time => &self.time,
            TextKind::Address => &self.address,
        }
    }
}

/// Reject a form whose required fields are empty, naming each one.
pub fn validate_form(form: &InvitationForm) -> Result<(), CoreError> {
    let empty: Vec<&str> = [
        ("type", &form.preset),
        ("date", &form.date),
        ("time", &form.time),
        ("address", &form.address),
        ("email", &form.email),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field)
    .collect();

    if empty.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Required fields must not be empty: {}",
            empty.join(", ")
        )))
    }
}
