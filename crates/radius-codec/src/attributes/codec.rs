//! Typed value <-> wire bytes conversion, driven by the dictionary's
//! declared type string.
//!
//! The mapping here is pure: it never touches secrets, authenticators, or
//! packet offsets. User-Password hiding and Message-Authenticator placement
//! are packet-codec concerns layered on top of these conversions.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::attributes::AttributeValue;
use crate::error::CodecError;

/// Decode wire bytes into a typed value per the declared dictionary type.
///
/// Type strings are matched case-insensitively; `string`/`tagged-string`,
/// `octet`/`octets` and `integer`/`signed`/`tagged-integer` aliases collapse
/// onto one variant each. Returns `Ok(None)` for a declared type this codec
/// does not decode (`abinary`, `ether`, `ifid`, prefix types, ...); the
/// caller logs and skips the attribute. A wrong-length value for a
/// fixed-width type is an error.
pub fn decode_value(declared: &str, bytes: &[u8]) -> Result<Option<AttributeValue>, CodecError> {
    let value = match declared.to_ascii_lowercase().as_str() {
        "string" | "tagged-string" => {
            let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                CodecError::AttributeError(format!("invalid UTF-8 in string attribute: {e}"))
            })?;
            AttributeValue::String(text)
        }
        "octet" | "octets" => AttributeValue::Octets(bytes.to_vec()),
        "ipaddr" => {
            let raw: [u8; 4] = fixed(declared, bytes)?;
            AttributeValue::Ipv4(Ipv4Addr::from(raw))
        }
        "ipv6addr" => {
            let raw: [u8; 16] = fixed(declared, bytes)?;
            AttributeValue::Ipv6(Ipv6Addr::from(raw))
        }
        "date" => AttributeValue::Date(u32::from_be_bytes(fixed(declared, bytes)?)),
        "short" => AttributeValue::Short(u16::from_be_bytes(fixed(declared, bytes)?)),
        "integer" | "signed" | "tagged-integer" => {
            AttributeValue::Integer(u32::from_be_bytes(fixed(declared, bytes)?))
        }
        "integer64" => AttributeValue::Integer64(u64::from_be_bytes(fixed(declared, bytes)?)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Encode a typed value into wire bytes per the declared dictionary type.
///
/// Unlike decoding, a value with no mapping onto the declared type is fatal:
/// the caller named the attribute, so a shape mismatch is a programming
/// error, not wire noise.
pub fn encode_value(declared: &str, value: &AttributeValue) -> Result<Vec<u8>, CodecError> {
    let bytes = match (declared.to_ascii_lowercase().as_str(), value) {
        ("string" | "tagged-string", AttributeValue::String(s)) => s.as_bytes().to_vec(),
        ("octet" | "octets", AttributeValue::Octets(b)) => b.clone(),
        // Text placed into an octets-typed attribute is carried verbatim.
        ("octet" | "octets", AttributeValue::String(s)) => s.as_bytes().to_vec(),
        ("ipaddr", AttributeValue::Ipv4(addr)) => addr.octets().to_vec(),
        ("ipv6addr", AttributeValue::Ipv6(addr)) => addr.octets().to_vec(),
        ("date", AttributeValue::Date(secs)) => secs.to_be_bytes().to_vec(),
        ("date", AttributeValue::Integer(secs)) => secs.to_be_bytes().to_vec(),
        ("short", AttributeValue::Short(v)) => v.to_be_bytes().to_vec(),
        ("integer" | "signed" | "tagged-integer", AttributeValue::Integer(v)) => {
            v.to_be_bytes().to_vec()
        }
        ("integer64", AttributeValue::Integer64(v)) => v.to_be_bytes().to_vec(),
        _ => {
            return Err(CodecError::UnsupportedAttributeType {
                declared: declared.to_string(),
                value_kind: value.kind(),
            });
        }
    };
    Ok(bytes)
}

fn fixed<const N: usize>(declared: &str, bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| {
        CodecError::AttributeError(format!(
            "expected {N} bytes for {declared} attribute, got {}",
            bytes.len()
        ))
    })
}
