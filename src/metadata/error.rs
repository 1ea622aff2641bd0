use thiserror::Error;

/// Why an image produced no metadata signal.
///
/// These never leave the extractor. They are logged and turned into "no signal".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataError {
    /// The container carries no EXIF block at all.
    #[error("no EXIF metadata present")]
    NoExif,

    /// EXIF is present but a required GPS tag is missing.
    #[error("missing GPS tag {tag}")]
    MissingTag { tag: &'static str },

    /// Container or tag contents could not be decoded.
    #[error("malformed metadata: {reason}")]
    Malformed { reason: String },

    /// The tag decoded to (0, 0), the usual artifact of zero-filled GPS blocks.
    #[error("GPS tag decodes to the (0, 0) sentinel")]
    NullIsland,

    /// The decoded coordinate is outside WGS84 ranges.
    #[error("GPS coordinate out of range: ({latitude}, {longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },
}

impl MetadataError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        MetadataError::Malformed {
            reason: reason.into(),
        }
    }

    /// `true` when the image simply has no GPS data, as opposed to broken data.
    pub fn is_absent(&self) -> bool {
        matches!(self, MetadataError::NoExif | MetadataError::MissingTag { .. })
    }
}
