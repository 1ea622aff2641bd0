use thiserror::Error;

/// Failure of one reverse-geocoding lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("geocoder timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("geocoder transport error: {message}")]
    Transport { message: String },

    #[error("geocoder returned status {status}")]
    Status { status: u16 },

    #[error("malformed geocoder response: {message}")]
    MalformedResponse { message: String },
}

impl GeocodeError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GeocodeError::Timeout { .. } | GeocodeError::Transport { .. } => true,
            GeocodeError::Status { status } => is_transient_status(*status),
            GeocodeError::MalformedResponse { .. } => false,
        }
    }
}

/// Rate limiting and gateway failures are worth retrying; other statuses are not.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}
