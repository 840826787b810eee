//! CHAP verification (RFC 2865 Section 5.3).
//!
//! With CHAP the password never crosses the wire: the peer answers
//! `MD5(ident + password + challenge)`, and the NAS forwards the answer in a
//! CHAP-Password attribute (one identifier byte, then the 16-byte digest).
//! The challenge is the CHAP-Challenge attribute when present, otherwise the
//! request authenticator stands in.

use crate::attributes::AttributeValue;
use crate::error::CodecError;
use crate::packet::Packet;

/// Expected CHAP answer for an identifier, password and challenge.
pub fn compute_chap_response(ident: u8, password: &[u8], challenge: &[u8]) -> [u8; 16] {
    let message: Vec<u8> = std::iter::once(ident)
        .chain(password.iter().copied())
        .chain(challenge.iter().copied())
        .collect();
    md5::compute(message).0
}

/// Verify a raw CHAP-Password attribute value against a known password.
///
/// The value must be exactly 17 bytes: the CHAP identifier followed by the
/// peer's answer.
pub fn verify_chap_response(
    chap_password: &[u8],
    password: &[u8],
    challenge: &[u8],
) -> Result<bool, CodecError> {
    match chap_password {
        [ident, answer @ ..] if answer.len() == 16 => {
            Ok(answer == &compute_chap_response(*ident, password, challenge))
        }
        _ => Err(CodecError::AttributeError(format!(
            "CHAP-Password must be 17 bytes, got {}",
            chap_password.len()
        ))),
    }
}

/// Check the CHAP answer carried in a parsed Access-Request.
///
/// Reads the CHAP-Password and CHAP-Challenge attributes from the packet; a
/// missing CHAP-Challenge falls back to the request authenticator.
pub fn verify_packet_chap(packet: &Packet, password: &[u8]) -> Result<bool, CodecError> {
    let chap_password = octets_attribute(packet, "CHAP-Password")?.ok_or_else(|| {
        CodecError::AttributeError("packet has no CHAP-Password attribute".to_string())
    })?;
    let challenge = match octets_attribute(packet, "CHAP-Challenge")? {
        Some(bytes) => bytes,
        None => packet.authenticator.as_slice(),
    };
    verify_chap_response(chap_password, password, challenge)
}

fn octets_attribute<'a>(packet: &'a Packet, name: &str) -> Result<Option<&'a [u8]>, CodecError> {
    match packet.attribute(name)? {
        None => Ok(None),
        Some(AttributeValue::Octets(bytes)) => Ok(Some(bytes)),
        Some(other) => Err(CodecError::AttributeError(format!(
            "{name} must be octets, found {}",
            other.kind()
        ))),
    }
}
