//! Drag-and-drop file import.
//!
//! Dropped files are classified by the `nm_ext_type` discriminator and then
//! merged into the tree by name (collections) or registered with the service
//! registry (services). Rejections carry typed errors that callers log and
//! drop, so a bad file still degrades to "no visible change".

use serde_json::Value;

use crate::document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    UnsupportedExtension(String),
    Parse(String),
    MissingName,
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::UnsupportedExtension(name) => {
                write!(f, "unsupported file extension: {name}")
            }
            ImportError::Parse(msg) => write!(f, "import is not valid JSON: {msg}"),
            ImportError::MissingName => write!(f, "import has no name field"),
        }
    }
}

impl std::error::Error for ImportError {}

/// The tree- or registry-bound content of one dropped file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// Collections to merge into the top level by name.
    Collections(Vec<Value>),
    /// Service descriptors for the registry; no tree change.
    Services(Vec<Value>),
}

/// Classify the contents of a dropped file.
///
/// Only `.json` files (case-insensitive) are accepted, and the top-level
/// `name` is required before anything else is looked at. `sources` payloads
/// contribute each entry of their child list as a collection; `collections`
/// payloads are a single collection; `services` payloads carry service
/// descriptors. A payload without a discriminator is treated as a single
/// collection, which is also what lets plain catalog files be imported.
pub fn classify(file_name: &str, bytes: &[u8]) -> Result<ImportPayload, ImportError> {
    if !file_name.to_ascii_lowercase().ends_with(".json") {
        return Err(ImportError::UnsupportedExtension(file_name.to_string()));
    }

    let json: Value =
        serde_json::from_slice(bytes).map_err(|e| ImportError::Parse(e.to_string()))?;
    if document::name(&json).is_none() {
        return Err(ImportError::MissingName);
    }

    match document::ext_type(&json) {
        Some("services") => Ok(ImportPayload::Services(
            document::services(&json).cloned().unwrap_or_default(),
        )),
        Some("sources") => Ok(ImportPayload::Collections(
            document::layers(&json).cloned().unwrap_or_default(),
        )),
        _ => Ok(ImportPayload::Collections(vec![json])),
    }
}
