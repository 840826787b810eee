//! Message-Authenticator support (RFC 2869 Section 5.14).
//!
//! The attribute value is `HMAC-MD5(secret, code + id + length +
//! authenticator + attributes)` computed as if its own 16 bytes were zero.
//! Both directions share one digest routine that feeds the HMAC in spans
//! around the value field, so neither the serializer nor the verifier needs
//! a zero-patched scratch copy of the datagram.

use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

/// Message-Authenticator digest over a serialized packet, with the 16 value
/// bytes at `value_offset` taken as zero regardless of their contents.
///
/// `value_offset` points at the attribute's value, two bytes past the
/// attribute itself; `value_offset + 16` must lie within the packet.
pub fn calculate_message_authenticator(
    packet: &[u8],
    secret: &[u8],
    value_offset: usize,
) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&packet[..value_offset]);
    mac.update(&[0u8; 16]);
    mac.update(&packet[value_offset + 16..]);
    mac.finalize().into_bytes().into()
}

/// Check the Message-Authenticator inside a received packet against its
/// recomputed digest.
pub fn verify_message_authenticator(packet: &[u8], secret: &[u8], value_offset: usize) -> bool {
    let Some(received) = packet.get(value_offset..value_offset + 16) else {
        return false;
    };
    calculate_message_authenticator(packet, secret, value_offset) == received
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_same_inputs() {
        let packet = vec![0u8; 40];
        assert_eq!(
            calculate_message_authenticator(&packet, b"testing123", 22),
            calculate_message_authenticator(&packet, b"testing123", 22)
        );
    }

    #[test]
    fn test_value_field_contents_do_not_affect_digest() {
        let mut packet = vec![0u8; 40];
        let clean = calculate_message_authenticator(&packet, b"testing123", 22);
        packet[22..38].fill(0xFF);
        assert_eq!(
            calculate_message_authenticator(&packet, b"testing123", 22),
            clean
        );
    }

    #[test]
    fn test_secret_and_packet_changes_change_digest() {
        let packet = vec![0u8; 40];
        let mut other = packet.clone();
        other[0] = 1;

        assert_ne!(
            calculate_message_authenticator(&packet, b"one", 22),
            calculate_message_authenticator(&packet, b"two", 22)
        );
        assert_ne!(
            calculate_message_authenticator(&packet, b"one", 22),
            calculate_message_authenticator(&other, b"one", 22)
        );
    }

    #[test]
    fn test_verify_round_trip() {
        let mut packet = vec![0u8; 40];
        let offset = 22;

        let digest = calculate_message_authenticator(&packet, b"testing123", offset);
        packet[offset..offset + 16].copy_from_slice(&digest);

        assert!(verify_message_authenticator(&packet, b"testing123", offset));
        assert!(!verify_message_authenticator(&packet, b"wrong", offset));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let mut packet = vec![0u8; 40];
        let offset = 22;
        let digest = calculate_message_authenticator(&packet, b"testing123", offset);
        packet[offset..offset + 16].copy_from_slice(&digest);
        packet[2] ^= 0x01;

        assert!(!verify_message_authenticator(&packet, b"testing123", offset));
    }

    #[test]
    fn test_verify_out_of_bounds_offset() {
        let packet = vec![0u8; 20];
        assert!(!verify_message_authenticator(&packet, b"testing123", 100));
        assert!(!verify_message_authenticator(&packet, b"testing123", 10));
    }
}
