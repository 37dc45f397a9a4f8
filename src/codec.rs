//! Binary codec framing sketches for the verification side-file.
//!
//! A sketch travels as `base64(gzip(tag || lanes))`: one ASCII tag byte from
//! `{S, M, L}` naming the variant, followed by the little-endian packing of
//! its lane array, gzip-compressed at the fastest level and base64-encoded
//! with the standard alphabet (padded). The empty string denotes a disabled
//! sketch. The tag byte is authoritative for deciding which lane-array shape
//! to allocate on import.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{QcdError, Result};
use crate::sketch::Sketch;

/// Encode a sketch as a side-file blob.
///
/// A disabled sketch encodes as the empty string; an auto-selecting sketch
/// materializes its chosen concrete variant first.
///
/// # Errors
///
/// Returns an error only if the gzip encoder fails, which cannot happen when
/// writing to memory under normal conditions.
pub fn pack(sketch: &Sketch) -> Result<String> {
    let Some((tag, lanes)) = sketch.export_parts() else {
        return Ok(String::new());
    };
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&[tag])?;
    encoder.write_all(&lanes)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Decode a side-file blob back into a concrete sketch.
///
/// The empty string yields [`Sketch::Disabled`].
///
/// # Errors
///
/// Returns [`QcdError::SketchBase64`] on malformed base64,
/// [`QcdError::SketchDecode`] on a bad gzip stream or empty frame,
/// [`QcdError::UnknownSketchTag`] on an unrecognized tag, and
/// [`QcdError::SketchSize`] when the lane bytes do not match the tagged
/// variant.
pub fn unpack(blob: &str) -> Result<Sketch> {
    if blob.is_empty() {
        return Ok(Sketch::Disabled);
    }
    let compressed = STANDARD.decode(blob)?;
    let mut raw = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(|err| QcdError::SketchDecode(err.to_string()))?;
    let Some((&tag, lanes)) = raw.split_first() else {
        return Err(QcdError::SketchDecode("empty sketch frame".to_string()));
    };
    Sketch::from_parts(tag, lanes)
}
