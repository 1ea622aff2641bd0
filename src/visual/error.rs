use thiserror::Error;

/// Failures of the visual geolocation capability.
///
/// The adapter absorbs all of these into "no visual signal".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisualModelError {
    #[error("visual model timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("visual model unavailable: {message}")]
    Unavailable { message: String },

    #[error("visual model returned status {status}")]
    Status { status: u16 },

    #[error("malformed visual model response: {message}")]
    MalformedResponse { message: String },
}
