//! Embedded GPS extraction.
//!
//! Reads the EXIF GPS IFD from JPEG, TIFF, PNG, WebP or HEIF containers and turns a
//! well-formed tag into a [`GeoSignal`] with [`SignalSource::Metadata`]. Anything short of
//! that (no EXIF, missing tags, broken rationals, the `(0, 0)` sentinel) is "no signal".

pub mod config;
pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod fixtures;


pub use config::MetadataConfig;
pub use error::MetadataError;

use std::io::Cursor;

use exif::{Exif, Field, In, Reader, Tag, Value};
use tracing::debug;

use crate::geo::{dms_to_decimal, is_null_island, is_valid_coordinate};
use crate::signal::{GeoSignal, SignalSource};

/// Turns embedded GPS tags into metadata signals.
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    config: MetadataConfig,
}

impl MetadataExtractor {
    pub fn new(config: MetadataConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    /// Returns the image's GPS position as a signal, or `None`.
    ///
    /// Never fails: every decoding problem is logged at `debug` and reported as absence.
    pub fn extract(&self, image: &[u8]) -> Option<GeoSignal> {
        let (latitude, longitude) = match read_gps_coordinate(image) {
            Ok(coordinate) => coordinate,
            Err(e) if e.is_absent() => {
                debug!(reason = %e, "No GPS metadata in image");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "Ignoring unusable GPS metadata");
                return None;
            }
        };

        match GeoSignal::new(
            SignalSource::Metadata,
            latitude,
            longitude,
            self.config.uncertainty_meters,
            self.config.confidence,
        ) {
            Ok(signal) => {
                debug!(latitude, longitude, "Extracted GPS metadata");
                Some(signal)
            }
            Err(e) => {
                debug!(error = %e, "Rejected metadata signal");
                None
            }
        }
    }
}

/// Decodes the signed `(latitude, longitude)` stored in the image's GPS IFD.
pub fn read_gps_coordinate(image: &[u8]) -> Result<(f64, f64), MetadataError> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(image))
        .map_err(|e| match e {
            exif::Error::NotFound(_) => MetadataError::NoExif,
            other => MetadataError::malformed(other.to_string()),
        })?;

    let latitude = read_axis(
        &exif,
        Tag::GPSLatitude,
        "GPSLatitude",
        Tag::GPSLatitudeRef,
        "GPSLatitudeRef",
        ['N', 'S'],
    )?;
    let longitude = read_axis(
        &exif,
        Tag::GPSLongitude,
        "GPSLongitude",
        Tag::GPSLongitudeRef,
        "GPSLongitudeRef",
        ['E', 'W'],
    )?;

    if is_null_island(latitude, longitude) {
        return Err(MetadataError::NullIsland);
    }
    if !is_valid_coordinate(latitude, longitude) {
        return Err(MetadataError::OutOfRange {
            latitude,
            longitude,
        });
    }

    Ok((latitude, longitude))
}

fn read_axis(
    exif: &Exif,
    value_tag: Tag,
    value_name: &'static str,
    ref_tag: Tag,
    ref_name: &'static str,
    hemispheres: [char; 2],
) -> Result<f64, MetadataError> {
    let value = field(exif, value_tag, value_name)?;
    // Without the hemisphere the sign is a guess, and a guess is a wrong answer half the time.
    let reference = hemisphere(field(exif, ref_tag, ref_name)?, hemispheres)?;
    let [degrees, minutes, seconds] = dms(value)?;
    Ok(dms_to_decimal(degrees, minutes, seconds, reference))
}

fn field<'a>(exif: &'a Exif, tag: Tag, name: &'static str) -> Result<&'a Field, MetadataError> {
    exif.get_field(tag, In::PRIMARY)
        .ok_or(MetadataError::MissingTag { tag: name })
}

fn hemisphere(field: &Field, allowed: [char; 2]) -> Result<char, MetadataError> {
    let reference = match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .and_then(|part| part.first())
            .map(|b| (*b as char).to_ascii_uppercase()),
        _ => None,
    };

    match reference {
        Some(c) if allowed.contains(&c) => Ok(c),
        Some(c) => Err(MetadataError::malformed(format!(
            "unexpected hemisphere reference '{c}'"
        ))),
        None => Err(MetadataError::malformed("hemisphere reference is not ASCII")),
    }
}

/// Degrees, minutes and seconds. Some writers store only degrees, or degrees plus
/// decimal minutes; missing components count as zero.
fn dms(field: &Field) -> Result<[f64; 3], MetadataError> {
    let Value::Rational(parts) = &field.value else {
        return Err(MetadataError::malformed("GPS coordinate is not RATIONAL"));
    };
    if parts.is_empty() || parts.len() > 3 {
        return Err(MetadataError::malformed(format!(
            "GPS coordinate has {} components",
            parts.len()
        )));
    }

    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        if part.denom == 0 {
            return Err(MetadataError::malformed("zero denominator in GPS rational"));
        }
        *slot = part.to_f64();
    }

    if out[1] >= 60.0 || out[2] >= 60.0 {
        return Err(MetadataError::malformed(format!(
            "minutes/seconds out of range: {} {}",
            out[1], out[2]
        )));
    }

    Ok(out)
}
