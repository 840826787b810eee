//! Datagram codec: parse bytes into packets and serialize packets into
//! bytes, with the dictionary resolving attribute identity and typing.
//!
//! Failure policy follows two distinct tracks that must not be merged:
//! packet-level problems (framing, authenticator mismatches, attributes
//! running past the end) abort with an error, while per-attribute problems
//! (dictionary misses, undecodable values) are logged and the attribute is
//! skipped.

use std::io::{ErrorKind, Read};

use tracing::warn;

use crate::attributes::{decode_value, encode_value, AttributeValue};
use crate::auth;
use crate::dictionary::{Dictionary, DictionaryAttribute, DictionaryVendorAttribute};
use crate::error::CodecError;
use crate::message_auth;
use crate::packet::{Code, Packet};

/// User-Password (RFC 2865 Section 5.2); hidden on the wire.
const USER_PASSWORD: u8 = 2;
/// Vendor-Specific (RFC 2865 Section 5.26).
const VENDOR_SPECIFIC: u8 = 26;
/// Message-Authenticator (RFC 2869 Section 5.14); zeroed placeholder until
/// the packet authenticator is final.
const MESSAGE_AUTHENTICATOR: u8 = 80;

/// Parse a complete datagram into a [`Packet`].
///
/// Integrity checks: the declared length must equal the buffer length;
/// Accounting-Request and Disconnect-Request authenticators are recomputed
/// and compared (a mismatch usually means the wrong shared secret); a
/// Message-Authenticator attribute, when present, is verified by HMAC-MD5
/// over the datagram with its value zeroed.
pub fn parse(dictionary: &Dictionary, secret: &[u8], data: &[u8]) -> Result<Packet, CodecError> {
    if data.len() < Packet::MIN_LENGTH {
        return Err(CodecError::InvalidFraming(format!(
            "datagram is {} bytes, minimum is {}",
            data.len(),
            Packet::MIN_LENGTH
        )));
    }
    let declared = u16::from_be_bytes([data[2], data[3]]) as usize;
    if declared != data.len() {
        return Err(CodecError::InvalidFraming(format!(
            "declared length {declared} does not match datagram length {}",
            data.len()
        )));
    }

    let code = Code::from_u8(data[0]).ok_or(CodecError::InvalidCode(data[0]))?;
    let identifier = data[1];
    let mut authenticator = [0u8; 16];
    authenticator.copy_from_slice(&data[4..20]);

    if matches!(code, Code::AccountingRequest | Code::DisconnectRequest) {
        let mut zeroed = data.to_vec();
        zeroed[4..20].fill(0);
        if auth::calculate_request_authenticator(&zeroed, secret) != authenticator {
            return Err(CodecError::InvalidRequestAuthenticator);
        }
    }

    let mut packet = Packet::from_wire(code, identifier, authenticator, secret);
    let mut message_authenticator_offset = None;

    let mut offset = Packet::MIN_LENGTH;
    while offset < data.len() {
        if offset + 2 > data.len() {
            return Err(CodecError::MalformedAttribute(offset));
        }
        let attr_type = data[offset];
        let attr_len = data[offset + 1] as usize;
        if attr_len < 2 || offset + attr_len > data.len() {
            return Err(CodecError::MalformedAttribute(offset));
        }
        let value = &data[offset + 2..offset + attr_len];

        if attr_type == VENDOR_SPECIFIC {
            parse_vendor_attribute(dictionary, &mut packet, value);
        } else {
            if attr_type == MESSAGE_AUTHENTICATOR {
                if attr_len == 18 {
                    message_authenticator_offset = Some(offset);
                } else {
                    warn!(
                        length = attr_len,
                        "Message-Authenticator with unexpected length"
                    );
                }
            }
            parse_base_attribute(
                dictionary,
                &mut packet,
                attr_type,
                value,
                secret,
                &authenticator,
            );
        }
        offset += attr_len;
    }

    if let Some(ma_offset) = message_authenticator_offset {
        if !message_auth::verify_message_authenticator(data, secret, ma_offset + 2) {
            return Err(CodecError::InvalidMessageAuthenticator);
        }
    }

    Ok(packet)
}

/// Serialize a packet into a datagram.
///
/// Attributes are written in insertion order. After the length field is
/// patched, the authenticator is finalized: a Request Authenticator digest
/// for Accounting/Disconnect/CoA requests, a Response Authenticator when the
/// packet retains the request's authenticator, and the construction-time
/// random value otherwise. A Message-Authenticator attribute is filled in
/// last, over the otherwise-final bytes. The packet should be treated as
/// frozen once serialized.
pub fn serialize(packet: &Packet, dictionary: &Dictionary) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::with_capacity(256);
    buffer.push(packet.code.as_u8());
    buffer.push(packet.identifier);
    buffer.extend_from_slice(&[0, 0]);
    buffer.extend_from_slice(&packet.authenticator);

    let mut message_authenticator_offset = None;

    for (name, values) in packet.entries() {
        for value in values {
            if let Some(definition) = dictionary.attribute_by_name(name) {
                write_base_attribute(
                    &mut buffer,
                    packet,
                    definition,
                    value,
                    &mut message_authenticator_offset,
                )?;
            } else if let Some(definition) = dictionary.vendor_attribute_by_name(name) {
                write_vendor_attribute(&mut buffer, definition, value)?;
            } else {
                return Err(CodecError::UnknownAttribute(name.to_string()));
            }
        }
    }

    let total = buffer.len();
    if total > Packet::MAX_LENGTH {
        return Err(CodecError::PacketTooLarge(total));
    }
    buffer[2..4].copy_from_slice(&(total as u16).to_be_bytes());

    if packet.code.uses_request_authenticator() {
        buffer[4..20].fill(0);
        let digest = auth::calculate_request_authenticator(&buffer, packet.secret());
        buffer[4..20].copy_from_slice(&digest);
    } else if let Some(request_authenticator) = packet.request_authenticator() {
        let digest = auth::calculate_response_authenticator(
            &buffer,
            request_authenticator,
            packet.secret(),
        );
        buffer[4..20].copy_from_slice(&digest);
    }

    if let Some(offset) = message_authenticator_offset {
        let digest =
            message_auth::calculate_message_authenticator(&buffer, packet.secret(), offset + 2);
        buffer[offset + 2..offset + 18].copy_from_slice(&digest);
    }

    Ok(buffer)
}

/// Read one length-prefixed packet from a byte stream (RFC 6613 framing).
///
/// A clean end-of-stream before any header byte returns `Ok(None)`. End of
/// stream inside the header or body is a framing error.
pub fn read_packet<R: Read>(
    reader: &mut R,
    dictionary: &Dictionary,
    secret: &[u8],
) -> Result<Option<Packet>, CodecError> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let count = reader.read(&mut header[filled..])?;
        if count == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(CodecError::InvalidFraming(format!(
                "end of stream after {filled} header bytes"
            )));
        }
        filled += count;
    }

    let declared = u16::from_be_bytes([header[2], header[3]]) as usize;
    if declared < Packet::MIN_LENGTH {
        return Err(CodecError::InvalidFraming(format!(
            "declared length {declared} is below the {}-byte minimum",
            Packet::MIN_LENGTH
        )));
    }

    let mut datagram = vec![0u8; declared];
    datagram[..4].copy_from_slice(&header);
    reader.read_exact(&mut datagram[4..]).map_err(|error| {
        if error.kind() == ErrorKind::UnexpectedEof {
            CodecError::InvalidFraming("end of stream inside packet body".to_string())
        } else {
            CodecError::Io(error)
        }
    })?;

    parse(dictionary, secret, &datagram).map(Some)
}

fn parse_base_attribute(
    dictionary: &Dictionary,
    packet: &mut Packet,
    attr_type: u8,
    value: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) {
    let Some(definition) = dictionary.attribute_by_code(attr_type) else {
        warn!(attr_type, "skipping attribute missing from dictionary");
        return;
    };
    match decode_base_value(definition, value, secret, authenticator) {
        Ok(Some(decoded)) => packet.add_attribute(definition.name.clone(), decoded),
        Ok(None) => warn!(
            name = %definition.name,
            declared = %definition.attr_type,
            "attribute type not decoded; skipping"
        ),
        Err(error) => warn!(
            name = %definition.name,
            %error,
            "failed to decode attribute; skipping"
        ),
    }
}

fn decode_base_value(
    definition: &DictionaryAttribute,
    value: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Option<AttributeValue>, CodecError> {
    if definition.code == USER_PASSWORD {
        let padded = auth::unhide_user_password(value, secret, authenticator)?;
        return match definition.attr_type.to_ascii_lowercase().as_str() {
            "string" | "tagged-string" => {
                let trimmed = auth::strip_password_padding(padded);
                let text = String::from_utf8(trimmed).map_err(|e| {
                    CodecError::AttributeError(format!("invalid UTF-8 in password: {e}"))
                })?;
                Ok(Some(AttributeValue::String(text)))
            }
            // The raw decoded form keeps the zero padding.
            _ => decode_value(&definition.attr_type, &padded),
        };
    }
    decode_value(&definition.attr_type, value)
}

fn parse_vendor_attribute(dictionary: &Dictionary, packet: &mut Packet, value: &[u8]) {
    // VendorId(4) + VendorType(1) + VendorLength(1)
    if value.len() < 6 {
        warn!(
            length = value.len(),
            "skipping truncated Vendor-Specific attribute"
        );
        return;
    }
    let vendor_id = u32::from_be_bytes([value[0], value[1], value[2], value[3]]);
    let vendor_code = value[4];
    let vendor_length = value[5] as usize;
    if vendor_length < 2 || 4 + vendor_length != value.len() {
        warn!(
            vendor_id,
            vendor_code, "skipping Vendor-Specific attribute with inconsistent length"
        );
        return;
    }
    let vendor_value = &value[6..];

    let Some(definition) = dictionary.vendor_attribute(vendor_id, u32::from(vendor_code)) else {
        warn!(vendor_id, vendor_code, "skipping unknown vendor attribute");
        return;
    };
    match decode_value(&definition.attr_type, vendor_value) {
        Ok(Some(decoded)) => packet.add_attribute(definition.name.clone(), decoded),
        Ok(None) => warn!(
            name = %definition.name,
            declared = %definition.attr_type,
            "vendor attribute type not decoded; skipping"
        ),
        Err(error) => warn!(
            name = %definition.name,
            %error,
            "failed to decode vendor attribute; skipping"
        ),
    }
}

fn write_base_attribute(
    buffer: &mut Vec<u8>,
    packet: &Packet,
    definition: &DictionaryAttribute,
    value: &AttributeValue,
    message_authenticator_offset: &mut Option<usize>,
) -> Result<(), CodecError> {
    if definition.code == MESSAGE_AUTHENTICATOR {
        // Placeholder; patched after the packet authenticator is final.
        *message_authenticator_offset = Some(buffer.len());
        buffer.push(definition.code);
        buffer.push(18);
        buffer.extend_from_slice(&[0u8; 16]);
        return Ok(());
    }

    let mut bytes = encode_value(&definition.attr_type, value)?;
    if definition.code == USER_PASSWORD {
        bytes = auth::hide_user_password(&bytes, packet.secret(), &packet.authenticator)?;
    }

    let total = 2 + bytes.len();
    if total > 255 {
        return Err(CodecError::AttributeError(format!(
            "attribute {} is {total} bytes, exceeding the 255-byte limit",
            definition.name
        )));
    }
    buffer.push(definition.code);
    buffer.push(total as u8);
    buffer.extend_from_slice(&bytes);
    Ok(())
}

fn write_vendor_attribute(
    buffer: &mut Vec<u8>,
    definition: &DictionaryVendorAttribute,
    value: &AttributeValue,
) -> Result<(), CodecError> {
    let bytes = encode_value(&definition.attr_type, value)?;
    let total = 8 + bytes.len();
    if total > 255 {
        return Err(CodecError::AttributeError(format!(
            "vendor attribute {} is {total} bytes, exceeding the 255-byte limit",
            definition.name
        )));
    }
    buffer.push(VENDOR_SPECIFIC);
    buffer.push(total as u8);
    buffer.extend_from_slice(&definition.vendor_id.to_be_bytes());
    buffer.push(definition.vendor_code as u8);
    buffer.push((2 + bytes.len()) as u8);
    buffer.extend_from_slice(&bytes);
    Ok(())
}
