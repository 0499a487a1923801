//! Error types.
//!
//! `DocumentError` covers failures at the load/save boundary and is
//! returned to the caller. Everything that can go wrong inside the engine
//! itself is non-fatal and is reported as a [`Diagnostic`] instead.

use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[String]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.join(" -> ")
}

/// Errors that can occur while loading or saving a document.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::document;
///
/// let err = document::load_feature("[1, 2]").unwrap_err();
/// assert!(err.to_string().contains("single-entry object"));
/// ```
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The text is not valid JSON, or does not have the expected shape.
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// A feature entry was not an object with exactly one tag.
    #[error("Feature must be a single-entry object keyed by its tag, found: {0}")]
    FeatureShape(String),
}

/// A non-fatal anomaly found while indexing or resolving levels.
///
/// Diagnostics never abort an operation; the affected value degrades to
/// "contributes nothing" or to the untrained sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A criteria compare token was not recognized at load time. The
    /// feature is indexed under its wildcard key and matches permissively.
    #[error("Malformed criteria on {owner}: field '{field}' has unrecognized compare type '{token}'")]
    MalformedCriteria {
        owner: String,
        field: String,
        token: String,
    },

    /// Data the engine cannot use, such as an unrecognized feature tag.
    #[error("Structural inconsistency in {owner}: {detail}")]
    StructuralInconsistency { owner: String, detail: String },

    /// Traits whose defaults refer to each other in a loop.
    #[error("Default cycle detected: {}", format_cycle_path(.path))]
    DefaultCycle { path: Vec<String> },
}
