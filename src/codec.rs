//! Pure value codecs: textual/numeric token values to and from the
//! host's native representations.
//!
//! These never touch the host store. Anything that cannot be converted
//! reports so through an explicit `Option`/`Result` rather than a
//! sentinel value, so callers can tell "zero" apart from "unconvertible".

use thiserror::Error;

use crate::document::{Scalar, ShadowValue};

/// Fractional color channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
}

/// A single drop-shadow effect in host terms.
#[derive(Debug, Clone, PartialEq)]
pub struct DropShadow {
    pub color: Rgba,
    pub offset_x: f64,
    pub offset_y: f64,
    pub radius: f64,
    pub spread: f64,
    pub visible: bool,
    pub blend_mode: BlendMode,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("`{0}` is not a valid hex color")]
    InvalidColor(String),

    #[error("`{0}` does not parse to a finite dimension")]
    InvalidDimension(String),

    #[error("value shape has no host representation")]
    Unrepresentable,
}

/// Parses a 3/4/6/8-digit hex color, with or without the leading `#`.
/// Short forms duplicate each nibble; alpha defaults to 1.
pub fn parse_color(hex: &str) -> Option<Rgba> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };

    let channel = |i: usize| -> Option<f64> {
        let byte = u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok()?;
        Some(f64::from(byte) / 255.0)
    };

    Some(Rgba {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
        a: if expanded.len() == 8 { channel(6)? } else { 1.0 },
    })
}

/// Syntactic check used by the shadow validity pass. Requires the `#`.
pub fn is_valid_hex_color(value: &str) -> bool {
    value.starts_with('#') && parse_color(value).is_some()
}

/// Inverse of [`parse_color`]: rounds each channel to a byte and emits a
/// 6-digit hex string, appending the alpha byte only when alpha < 1.
pub fn rgba_to_hex(color: &Rgba) -> String {
    let to_byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    let hex = format!(
        "#{:02x}{:02x}{:02x}",
        to_byte(color.r),
        to_byte(color.g),
        to_byte(color.b)
    );
    if color.a < 1.0 {
        format!("{hex}{:02x}", to_byte(color.a))
    } else {
        hex
    }
}

/// Dimension codec. Unit strings dispatch on their suffix: `px` and `ms`
/// pass through, `rem`/`em` multiply by the fixed 16px root size, a bare
/// `s` converts to milliseconds. Anything else falls back to the leading
/// numeric prefix, and `0` when there is none.
pub fn parse_dimension(value: &Scalar) -> f64 {
    checked_dimension(value).unwrap_or(0.0)
}

/// Like [`parse_dimension`] but reports an unparsable value as `None`
/// instead of folding it into `0`. Shadow validation needs the distinction.
pub fn checked_dimension(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Number(n) => n.is_finite().then_some(*n),
        Scalar::Text(s) => {
            let t = s.trim().to_lowercase();
            let base = leading_float(&t)?;
            if t.ends_with("px") {
                Some(base)
            } else if t.ends_with("rem") || t.ends_with("em") {
                Some(base * 16.0)
            } else if t.ends_with("ms") {
                Some(base)
            } else if t.ends_with('s') {
                Some(base * 1000.0)
            } else {
                Some(base)
            }
        }
    }
}

/// Duration codec, always in milliseconds. Only `ms` and `s` suffixes are
/// meaningful; unparsable input yields `0`.
pub fn parse_duration(value: &Scalar) -> f64 {
    match value {
        Scalar::Number(n) => *n,
        Scalar::Text(s) => {
            let t = s.trim().to_lowercase();
            match leading_float(&t) {
                Some(v) if t.ends_with("ms") => v,
                Some(v) if t.ends_with('s') => v * 1000.0,
                Some(v) => v,
                None => 0.0,
            }
        }
    }
}

/// Converts a shadow-shaped value into a host drop shadow.
///
/// The shape check (the right keys exist) has already happened at parse
/// time; this validates the values themselves: the color must be a hex
/// string and all four dimension fields must parse to finite numbers.
pub fn parse_shadow(value: &ShadowValue) -> Result<DropShadow, ConvertError> {
    if !is_valid_hex_color(&value.color) {
        return Err(ConvertError::InvalidColor(value.color.clone()));
    }
    let color =
        parse_color(&value.color).ok_or_else(|| ConvertError::InvalidColor(value.color.clone()))?;

    let dim = |scalar: &Scalar| {
        checked_dimension(scalar).ok_or_else(|| ConvertError::InvalidDimension(scalar.to_string()))
    };

    Ok(DropShadow {
        color,
        offset_x: dim(&value.offset_x)?,
        offset_y: dim(&value.offset_y)?,
        radius: dim(&value.blur)?,
        spread: dim(&value.spread)?,
        visible: true,
        blend_mode: BlendMode::Normal,
    })
}

/// Longest numeric prefix of `s`, mimicking lenient `parseFloat`-style
/// reading of strings like `"16px"`.
pub(crate) fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim();
    for end in (1..=s.len()).rev() {
        if !s.is_char_boundary(end) {
            continue;
        }
        if let Ok(v) = s[..end].parse::<f64>() {
            if v.is_finite() {
                return Some(v);
            }
        }
    }
    None
}
