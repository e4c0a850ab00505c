//! Scalar normalization for externally supplied values.
//!
//! Sandbox reports encode the same integer as a native JSON number, a decimal
//! string, or a `0x`-prefixed hex string, and byte buffers as hex digit
//! strings. Everything here is a pure function.
//!
//! [`parse_integer`] works in `i128` so that every value a report can carry
//! (negative decimals and hex up to `u64::MAX`) survives. [`parse_address`]
//! and [`parse_word`] narrow that to the two widths report fields use.

use std::fmt;

use thiserror::Error;

/// What a scalar was expected to decode as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Integer,
    /// Non-negative and at most `u64::MAX`.
    Address,
    /// A machine word: anything from `i64::MIN` to `u64::MAX`.
    Word,
    HexBytes,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Integer => f.write_str("integer"),
            ScalarKind::Address => f.write_str("non-negative 64-bit integer"),
            ScalarKind::Word => f.write_str("64-bit integer"),
            ScalarKind::HexBytes => f.write_str("hex-encoded bytes"),
        }
    }
}

/// A hex, decimal, or byte-hex coercion failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed scalar {input:?}: expected {expected}")]
pub struct MalformedScalar {
    pub input: String,
    pub expected: ScalarKind,
}

impl MalformedScalar {
    fn new(input: &str, expected: ScalarKind) -> Self {
        Self { input: input.to_string(), expected }
    }
}

/// Integer input as it appears in external data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerInput<'a> {
    Text(&'a str),
    Native(i128),
}

impl fmt::Display for IntegerInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegerInput::Text(text) => f.write_str(text),
            IntegerInput::Native(n) => write!(f, "{n}"),
        }
    }
}

impl<'a> From<&'a str> for IntegerInput<'a> {
    fn from(value: &'a str) -> Self {
        IntegerInput::Text(value)
    }
}

impl From<u64> for IntegerInput<'_> {
    fn from(value: u64) -> Self {
        IntegerInput::Native(value.into())
    }
}

impl From<i64> for IntegerInput<'_> {
    fn from(value: i64) -> Self {
        IntegerInput::Native(value.into())
    }
}

/// Byte-buffer input as it appears in external data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesInput<'a> {
    Hex(&'a str),
    Raw(&'a [u8]),
}

impl<'a> From<&'a str> for BytesInput<'a> {
    fn from(value: &'a str) -> Self {
        BytesInput::Hex(value)
    }
}

impl<'a> From<&'a [u8]> for BytesInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        BytesInput::Raw(value)
    }
}

/// Normalize an integer given as `0x` hex text, signed decimal text, or a
/// native value. Native values come back unchanged.
///
/// ```
/// use facts_core::value::parse_integer;
/// assert_eq!(parse_integer("0x10").unwrap(), 16);
/// assert_eq!(parse_integer("16").unwrap(), 16);
/// assert_eq!(parse_integer("-1").unwrap(), -1);
/// assert_eq!(parse_integer(-16i64).unwrap(), -16);
/// ```
pub fn parse_integer<'a>(value: impl Into<IntegerInput<'a>>) -> Result<i128, MalformedScalar> {
    match value.into() {
        IntegerInput::Native(n) => Ok(n),
        IntegerInput::Text(text) => {
            let parsed = match strip_hex_prefix(text) {
                // from_str_radix would take "0x-1" as -1.
                Some(digits) if digits.starts_with(['+', '-']) => None,
                Some(digits) => i128::from_str_radix(digits, 16).ok(),
                None => text.parse::<i128>().ok(),
            };
            parsed.ok_or_else(|| MalformedScalar::new(text, ScalarKind::Integer))
        }
    }
}

/// Parse an integer that must fit in `u64`, such as a virtual address.
pub fn parse_address<'a>(value: impl Into<IntegerInput<'a>>) -> Result<u64, MalformedScalar> {
    let input = value.into();
    let n = parse_integer(input)?;
    u64::try_from(n).map_err(|_| MalformedScalar::new(&input.to_string(), ScalarKind::Address))
}

/// Parse a register-width value such as a call's return value.
///
/// Values above `i64::MAX` (up to `u64::MAX`) are taken as the two's
/// complement bit pattern, so `0xFFFFFFFFFFFFFFFF` reads as `-1`.
pub fn parse_word<'a>(value: impl Into<IntegerInput<'a>>) -> Result<i64, MalformedScalar> {
    let input = value.into();
    let n = parse_integer(input)?;
    i64::try_from(n)
        .or_else(|_| u64::try_from(n).map(|bits| bits as i64))
        .map_err(|_| MalformedScalar::new(&input.to_string(), ScalarKind::Word))
}

/// Decode a hex digit string into bytes; raw buffers pass through unchanged.
pub fn parse_bytes<'a>(value: impl Into<BytesInput<'a>>) -> Result<Vec<u8>, MalformedScalar> {
    match value.into() {
        BytesInput::Raw(buf) => Ok(buf.to_vec()),
        BytesInput::Hex(text) => {
            hex::decode(text).map_err(|_| MalformedScalar::new(text, ScalarKind::HexBytes))
        }
    }
}

/// Lowercase hex rendering used by the feature wire format.
pub fn encode_bytes(buf: &[u8]) -> String {
    hex::encode(buf)
}

/// Returns the digits after a `0x`/`0X` prefix, if present.
pub(crate) fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}
