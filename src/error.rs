//! Errors that cross the pipeline boundary.
//!
//! Every other fault (visual model timeouts, geocoder outages, malformed EXIF, store I/O)
//! is absorbed inside its component and shows up only as a degraded verdict.

use thiserror::Error;

/// Outcome of a failed `resolve`.
///
/// `Clone` because one outcome is fanned out to every caller waiting on the same fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Neither metadata nor visual inference produced a usable location.
    #[error("could not determine location: no usable signal available")]
    NoSignalAvailable,

    /// The resolution task ended without publishing an outcome. Not cached; the next
    /// request for the same image starts over.
    #[error("resolution aborted: {reason}")]
    Aborted { reason: String },
}

impl ResolveError {
    /// Returns `true` if the failure should be remembered as a `Failed` cache entry.
    #[inline]
    pub fn is_definitive(&self) -> bool {
        matches!(self, ResolveError::NoSignalAvailable)
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
