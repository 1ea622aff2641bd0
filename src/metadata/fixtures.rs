//! Minimal JPEG builders carrying an EXIF GPS IFD, for tests.
//!
//! The TIFF block is little-endian with IFD0 at offset 8. IFD0 holds a single entry: either
//! the GPS IFD pointer or, for images without GPS, an orientation tag.

use crate::geo::decimal_to_dms;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const TAG_ORIENTATION: u16 = 0x0112;
const TAG_GPS_POINTER: u16 = 0x8825;
const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
const TAG_GPS_LATITUDE: u16 = 0x0002;
const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
const TAG_GPS_LONGITUDE: u16 = 0x0004;

const SECONDS_SCALE: u32 = 10_000;

/// Builds JPEG bytes with or without GPS metadata.
#[derive(Debug, Clone, Default)]
pub struct GpsJpegBuilder {
    coordinate: Option<(f64, f64)>,
    raw_latitude: Option<Vec<(u32, u32)>>,
    omit_refs: bool,
    no_exif: bool,
    comment: Vec<u8>,
}

impl GpsJpegBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embeds a signed decimal coordinate as DMS rationals with hemisphere refs.
    pub fn coordinate(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinate = Some((latitude, longitude));
        self
    }

    /// Replaces the encoded latitude rationals verbatim (e.g. with a zero denominator).
    pub fn raw_latitude(mut self, rationals: Vec<(u32, u32)>) -> Self {
        self.raw_latitude = Some(rationals);
        self
    }

    /// Drops the `GPSLatitudeRef`/`GPSLongitudeRef` tags.
    pub fn without_refs(mut self) -> Self {
        self.omit_refs = true;
        self
    }

    /// Emits a JPEG with no APP1 segment at all.
    pub fn without_exif(mut self) -> Self {
        self.no_exif = true;
        self
    }

    /// Adds a COM segment, which changes the bytes (and fingerprint) but not the metadata.
    pub fn comment(mut self, text: impl AsRef<[u8]>) -> Self {
        self.comment = text.as_ref().to_vec();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];

        if !self.no_exif {
            let tiff = self.tiff();
            let len = (2 + 6 + tiff.len()) as u16;
            out.extend_from_slice(&[0xFF, 0xE1]);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(b"Exif\0\0");
            out.extend_from_slice(&tiff);
        }

        if !self.comment.is_empty() {
            let len = (2 + self.comment.len()) as u16;
            out.extend_from_slice(&[0xFF, 0xFE]);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&self.comment);
        }

        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    fn tiff(&self) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());

        let Some((latitude, longitude)) = self.coordinate else {
            let orientation =
                IfdEntry::new(TAG_ORIENTATION, TYPE_SHORT, 1, 1u16.to_le_bytes().to_vec());
            write_ifd(&mut tiff, &[orientation]);
            return tiff;
        };

        // IFD0 with one entry is 18 bytes, so the GPS IFD starts at 8 + 18.
        let gps_offset: u32 = 8 + 2 + 12 + 4;
        write_ifd(
            &mut tiff,
            &[IfdEntry::new(
                TAG_GPS_POINTER,
                TYPE_LONG,
                1,
                gps_offset.to_le_bytes().to_vec(),
            )],
        );

        let latitude_rationals = self
            .raw_latitude
            .clone()
            .unwrap_or_else(|| dms_rationals(latitude));
        let longitude_rationals = dms_rationals(longitude);

        let mut entries = Vec::new();
        if !self.omit_refs {
            let reference = if latitude < 0.0 { b'S' } else { b'N' };
            entries.push(IfdEntry::new(
                TAG_GPS_LATITUDE_REF,
                TYPE_ASCII,
                2,
                vec![reference, 0],
            ));
        }
        entries.push(rational_entry(TAG_GPS_LATITUDE, &latitude_rationals));
        if !self.omit_refs {
            let reference = if longitude < 0.0 { b'W' } else { b'E' };
            entries.push(IfdEntry::new(
                TAG_GPS_LONGITUDE_REF,
                TYPE_ASCII,
                2,
                vec![reference, 0],
            ));
        }
        entries.push(rational_entry(TAG_GPS_LONGITUDE, &longitude_rationals));

        write_ifd(&mut tiff, &entries);
        tiff
    }
}

/// JPEG carrying `(latitude, longitude)` in its GPS IFD.
pub fn jpeg_with_gps(latitude: f64, longitude: f64) -> Vec<u8> {
    GpsJpegBuilder::new().coordinate(latitude, longitude).build()
}

/// JPEG with EXIF but no GPS IFD. `tag` makes the bytes unique.
pub fn jpeg_without_gps(tag: &str) -> Vec<u8> {
    GpsJpegBuilder::new().comment(tag).build()
}

struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    payload: Vec<u8>,
}

impl IfdEntry {
    fn new(tag: u16, kind: u16, count: u32, payload: Vec<u8>) -> Self {
        Self {
            tag,
            kind,
            count,
            payload,
        }
    }
}

fn rational_entry(tag: u16, rationals: &[(u32, u32)]) -> IfdEntry {
    let mut payload = Vec::with_capacity(rationals.len() * 8);
    for (num, denom) in rationals {
        payload.extend_from_slice(&num.to_le_bytes());
        payload.extend_from_slice(&denom.to_le_bytes());
    }
    IfdEntry::new(tag, TYPE_RATIONAL, rationals.len() as u32, payload)
}

fn dms_rationals(decimal: f64) -> Vec<(u32, u32)> {
    let (mut degrees, mut minutes, seconds) = decimal_to_dms(decimal);
    let mut scaled = (seconds * SECONDS_SCALE as f64).round() as u32;
    if scaled >= 60 * SECONDS_SCALE {
        scaled -= 60 * SECONDS_SCALE;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes -= 60;
        degrees += 1;
    }
    vec![(degrees, 1), (minutes, 1), (scaled, SECONDS_SCALE)]
}

/// Appends one IFD at the current end of `out`, followed by its out-of-line values.
fn write_ifd(out: &mut Vec<u8>, entries: &[IfdEntry]) {
    let start = out.len();
    let data_start = start + 2 + entries.len() * 12 + 4;
    let mut data = Vec::new();

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.kind.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.payload.len() <= 4 {
            let mut inline = entry.payload.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&((data_start + data.len()) as u32).to_le_bytes());
            data.extend_from_slice(&entry.payload);
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&data);
}
