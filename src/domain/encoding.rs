//! Attribute value encoding
//!
//! Values travel over the air as ASCII text, one byte per character. Numbers
//! are rounded to [`DECIMAL_PLACES`] and rendered in their shortest form with
//! at least one fractional digit (`1.0`, `12.34568`).

use thiserror::Error;

/// Decimal places kept when rendering numeric process variables
pub const DECIMAL_PLACES: i32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

/// Round `value` to [`DECIMAL_PLACES`] decimal places.
///
/// Values too large to scale are returned unchanged; they carry no
/// fractional digits anyway.
pub fn round_decimal(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMAL_PLACES);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let mut text = round_decimal(value).to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

pub fn parse_number(text: &str) -> Result<f64, EncodingError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| EncodingError::NotANumber(text.trim().to_string()))
}

/// "1" while the value is non-zero, "0" otherwise
pub fn format_moving(text: &str) -> Result<String, EncodingError> {
    let value = parse_number(text)?;
    Ok(if value != 0.0 { "1" } else { "0" }.to_string())
}

pub fn encode_text(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decode a written value: one character per byte, surrounding whitespace
/// and NUL padding removed.
pub fn decode_text(bytes: &[u8]) -> String {
    let text: String = bytes.iter().map(|&b| b as char).collect();
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
