//! Messages crossing the sandbox boundary.
//!
//! The UI side posts exactly one request; the host side answers with a
//! notification and closes. There is no further back-and-forth.

use serde::{Deserialize, Serialize};

/// Request from the plugin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiMessage {
    /// `{ "type": "import-json", "json": "<export document>" }`
    ImportJson { json: String },
    /// `{ "type": "cancel" }`
    Cancel,
}

impl UiMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// What happened to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported {
        name: String,
        created: usize,
        /// Non-fatal problems (font fallbacks, dropped images).
        warnings: Vec<String>,
    },
    Rejected { reason: String },
    Cancelled,
}

impl ImportOutcome {
    /// The notification text shown to the user.
    pub fn notice(&self) -> String {
        match self {
            ImportOutcome::Imported { name, warnings, .. } if warnings.is_empty() => {
                format!("Imported \"{name}\"")
            }
            ImportOutcome::Imported { name, warnings, .. } => {
                format!("Imported \"{name}\" with {} warning(s)", warnings.len())
            }
            ImportOutcome::Rejected { reason } => format!("Import failed: {reason}"),
            ImportOutcome::Cancelled => "Import cancelled".to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ImportOutcome::Rejected { .. })
    }
}
