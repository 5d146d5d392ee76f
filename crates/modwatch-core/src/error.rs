//! Error types for modwatch-core

use thiserror::Error;

/// Failures raised by the safety checker.
///
/// The taxonomy is embedded in the binary, so these paths are defensive:
/// callers still have to surface them (HTTP responds 503, the realtime
/// channel answers the sending connection with an error reply).
#[derive(Error, Debug)]
pub enum ModerationError {
    #[error("moderation service unavailable: keyword taxonomy is empty")]
    TaxonomyUnavailable,

    #[error("moderation service unavailable: category '{category}' has no trigger phrases")]
    EmptyCategory { category: String },
}
