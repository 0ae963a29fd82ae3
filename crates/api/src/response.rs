//! Response bodies shared by the config editor handlers.
//!
//! Listings use an `{"items": [...]}` envelope and mutations answer with
//! `{"ok": true}`, optionally naming the stored file.

use serde::Serialize;

/// `{ "items": [...] }` listing envelope.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T: Serialize> {
    pub items: Vec<T>,
}

/// Acknowledgement of a successful mutation.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            filename: None,
        }
    }

    pub fn stored(filename: impl Into<String>) -> Self {
        Self {
            ok: true,
            filename: Some(filename.into()),
        }
    }
}
