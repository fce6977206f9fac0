//! Stream filters needed to read the file structure itself.
//!
//! Page content is copied opaquely and never decoded; only cross-reference
//! streams and object streams go through here, so `FlateDecode` with its
//! predictors is the only filter supported.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::warn;

use crate::error::{PdfSpliceError, Result};
use crate::object::{Dictionary, Object};

/// Undo every filter declared by `dict` on `data`.
pub(crate) fn decode(dict: &Dictionary, data: &[u8]) -> Result<Vec<u8>> {
    let filters: Vec<&[u8]> = match dict.get(b"Filter") {
        None | Some(Object::Null) => return Ok(data.to_vec()),
        Some(Object::Name(name)) => vec![name.as_slice()],
        Some(Object::Array(items)) => items.iter().filter_map(Object::as_name).collect(),
        Some(other) => {
            return Err(PdfSpliceError::malformed(format!(
                "/Filter is a {}",
                other.type_label()
            )));
        }
    };

    let mut out = data.to_vec();
    for (i, filter) in filters.iter().enumerate() {
        let params = decode_params(dict, i);
        out = match *filter {
            b"FlateDecode" | b"Fl" => {
                let inflated = inflate(&out)?;
                apply_predictor(inflated, &params)?
            }
            other => {
                return Err(PdfSpliceError::malformed(format!(
                    "unsupported filter /{}",
                    String::from_utf8_lossy(other)
                )));
            }
        };
    }
    Ok(out)
}

/// Flate-compress `data` at the default level.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        // Truncated or checksum-damaged streams usually still carry usable data.
        Err(err) if !out.is_empty() => {
            warn!(error = %err, recovered = out.len(), "flate stream damaged, using partial output");
            Ok(out)
        }
        Err(err) => Err(PdfSpliceError::malformed(format!("flate decode failed: {err}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PredictorParams {
    predictor: i64,
    colors: usize,
    bits_per_component: usize,
    columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }

    fn row_len(&self) -> usize {
        (self.colors * self.bits_per_component * self.columns).div_ceil(8)
    }
}

fn decode_params(dict: &Dictionary, filter_index: usize) -> PredictorParams {
    let params = match dict.get(b"DecodeParms").or_else(|| dict.get(b"DP")) {
        Some(Object::Dictionary(params)) => Some(params),
        Some(Object::Array(items)) => items.get(filter_index).and_then(Object::as_dict),
        _ => None,
    };
    let Some(params) = params else {
        return PredictorParams::default();
    };

    let get = |key: &[u8], default: i64| {
        params
            .get(key)
            .and_then(Object::as_i64)
            .unwrap_or(default)
    };
    PredictorParams {
        predictor: get(b"Predictor", 1),
        colors: get(b"Colors", 1).clamp(1, 32) as usize,
        bits_per_component: get(b"BitsPerComponent", 8).clamp(1, 16) as usize,
        columns: get(b"Columns", 1).max(1) as usize,
    }
}

fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data),
        2 => Ok(undo_tiff(data, params)),
        10..=15 => undo_png(&data, params),
        other => Err(PdfSpliceError::malformed(format!(
            "unsupported predictor {other}"
        ))),
    }
}

fn undo_tiff(mut data: Vec<u8>, params: &PredictorParams) -> Vec<u8> {
    if params.bits_per_component != 8 {
        warn!(
            bpc = params.bits_per_component,
            "TIFF predictor only handled for 8-bit samples"
        );
        return data;
    }
    let row_len = params.row_len();
    let bpp = params.colors;
    for row in data.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    data
}

fn undo_png(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_len = params.row_len();
    let bpp = params.bytes_per_pixel();
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_len];

    // Each encoded row is a filter-type byte followed by `row_len` bytes.
    for chunk in data.chunks(row_len + 1) {
        if chunk.len() < 2 {
            break;
        }
        let tag = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_len, 0);

        for i in 0..row_len {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(PdfSpliceError::malformed(format!(
                        "bad PNG predictor tag {other}"
                    )));
                }
            };
            row[i] = row[i].wrapping_add(predicted);
        }

        out.extend_from_slice(&row);
        prev = row;
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
