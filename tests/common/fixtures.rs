//! Test fixtures: JPEG bytes and well-known coordinates.

pub use geoverdict::metadata::fixtures::{GpsJpegBuilder, jpeg_with_gps, jpeg_without_gps};

use geoverdict::visual::VisualPrediction;

pub const EIFFEL_TOWER: (f64, f64) = (48.8584, 2.2945);
pub const NEW_YORK: (f64, f64) = (40.7128, -74.0060);
pub const LONDON: (f64, f64) = (51.5074, -0.1278);
/// Roughly 50 km due north of [`LONDON`].
pub const NORTH_OF_LONDON: (f64, f64) = (51.9574, -0.1278);

/// DMS encoding keeps four decimal places of seconds, well under a meter.
pub const COORDINATE_TOLERANCE: f64 = 1e-5;

pub fn prediction(at: (f64, f64), confidence: f64) -> VisualPrediction {
    VisualPrediction::new(at.0, at.1, confidence)
}

/// A JPEG with EXIF but no GPS whose bytes are unique to `tag`.
pub fn unlocated_image(tag: &str) -> Vec<u8> {
    jpeg_without_gps(tag)
}

/// A GPS-tagged JPEG whose bytes are unique to `tag`.
pub fn located_image(at: (f64, f64), tag: &str) -> Vec<u8> {
    GpsJpegBuilder::new().coordinate(at.0, at.1).comment(tag).build()
}
