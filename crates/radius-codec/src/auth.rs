//! Authenticator construction and the User-Password hiding scheme.
//!
//! MD5 and HMAC-MD5 are mandated by RFC 2865/2869 despite their
//! cryptographic weakness; substituting a stronger hash would break
//! interoperability.

use rand::Rng;

use crate::error::CodecError;

/// Longest User-Password the hiding scheme accepts (RFC 2865 Section 5.2).
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Generate a random authenticator for Access-Request and Status-Server
/// packets (RFC 2865 Section 3).
///
/// Drawn from a cryptographically strong RNG; zero bytes are re-drawn so the
/// value never contains one.
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut rng = rand::rng();
    let mut authenticator = [0u8; 16];
    rng.fill(&mut authenticator);
    for byte in authenticator.iter_mut() {
        while *byte == 0 {
            *byte = rng.random();
        }
    }
    authenticator
}

/// Calculate the Request Authenticator for Accounting-Request,
/// Disconnect-Request and CoA-Request packets (RFC 2866 Section 3).
///
/// `packet` is the fully serialized datagram with the 16 authenticator bytes
/// zeroed; the digest is `MD5(code + id + length + 16 zeros + attributes +
/// secret)`.
pub fn calculate_request_authenticator(packet: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut data = Vec::with_capacity(packet.len() + secret.len());
    data.extend_from_slice(packet);
    data.extend_from_slice(secret);
    md5::compute(&data).0
}

/// Calculate the Response Authenticator (RFC 2865 Section 3).
///
/// `packet` is the fully serialized response; its own authenticator field is
/// ignored and the retained `request_authenticator` takes its place in the
/// digest: `MD5(code + id + length + request authenticator + attributes +
/// secret)`.
pub fn calculate_response_authenticator(
    packet: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> [u8; 16] {
    let mut data = Vec::with_capacity(packet.len() + secret.len());
    data.extend_from_slice(&packet[..4]);
    data.extend_from_slice(request_authenticator);
    data.extend_from_slice(&packet[20..]);
    data.extend_from_slice(secret);
    md5::compute(&data).0
}

/// Verify the Response Authenticator carried in a serialized response.
pub fn verify_response_authenticator(
    packet: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    if packet.len() < 20 {
        return false;
    }
    let calculated = calculate_response_authenticator(packet, request_authenticator, secret);
    packet[4..20] == calculated
}

/// Hide a cleartext User-Password (RFC 2865 Section 5.2).
///
/// The cleartext is zero-padded to a multiple of 16 bytes, then each block
/// is XORed with a chained MD5 stream: `b(0) = MD5(secret +
/// authenticator)`, `b(i) = MD5(secret + c(i-1))`.
pub fn hide_user_password(
    password: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, CodecError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(CodecError::AttributeError(format!(
            "password too long: {} bytes (max {MAX_PASSWORD_LENGTH})",
            password.len()
        )));
    }

    let mut padded = password.to_vec();
    let padded_len = password.len().div_ceil(16).max(1) * 16;
    padded.resize(padded_len, 0);

    let mut hidden = Vec::with_capacity(padded_len);
    let mut chain: [u8; 16] = *authenticator;

    for block in padded.chunks(16) {
        let mut data = Vec::with_capacity(secret.len() + 16);
        data.extend_from_slice(secret);
        data.extend_from_slice(&chain);
        let mask = md5::compute(&data).0;

        let mut cipher = [0u8; 16];
        for (i, byte) in cipher.iter_mut().enumerate() {
            *byte = block[i] ^ mask[i];
        }
        chain = cipher;
        hidden.extend_from_slice(&cipher);
    }

    Ok(hidden)
}

/// Reverse [`hide_user_password`].
///
/// Returns the padded cleartext; trailing zero padding is only trimmed when
/// the value is turned into a UTF-8 string.
pub fn unhide_user_password(
    hidden: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, CodecError> {
    if hidden.is_empty() || hidden.len() % 16 != 0 || hidden.len() > MAX_PASSWORD_LENGTH {
        return Err(CodecError::AttributeError(format!(
            "hidden password must be a non-empty multiple of 16 bytes up to \
             {MAX_PASSWORD_LENGTH}, got {}",
            hidden.len()
        )));
    }

    let mut cleartext = Vec::with_capacity(hidden.len());
    let mut chain: &[u8] = authenticator;

    for block in hidden.chunks(16) {
        let mut data = Vec::with_capacity(secret.len() + 16);
        data.extend_from_slice(secret);
        data.extend_from_slice(chain);
        let mask = md5::compute(&data).0;

        for (i, &byte) in block.iter().enumerate() {
            cleartext.push(byte ^ mask[i]);
        }
        chain = block;
    }

    Ok(cleartext)
}

/// Trim the zero padding [`unhide_user_password`] leaves in place.
pub fn strip_password_padding(mut padded: Vec<u8>) -> Vec<u8> {
    while padded.last() == Some(&0) {
        padded.pop();
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_authenticators_are_random_and_nonzero() {
        let a = generate_request_authenticator();
        let b = generate_request_authenticator();
        assert_ne!(a, b);
        assert!(a.iter().all(|&byte| byte != 0));
        assert!(b.iter().all(|&byte| byte != 0));
    }

    #[test]
    fn test_hide_rfc2865_vector() {
        // Inputs from the RFC 2865 Section 7.1 exchange; expected block
        // computed independently from the Section 5.2 construction.
        let secret = b"xyzzy5461";
        let authenticator: [u8; 16] = hex::decode("0c0ba47ea2934c496fd03ae7e1625d82")
            .unwrap()
            .try_into()
            .unwrap();

        let hidden = hide_user_password(b"arctangent", secret, &authenticator).unwrap();
        assert_eq!(hex::encode(&hidden), "dec2eb35560c78be43ee933b904cebcf");
    }

    #[test]
    fn test_password_round_trip_lengths() {
        let secret = b"sharedsecret";
        let authenticator = [7u8; 16];
        for len in [1usize, 15, 16, 17, 32, 127, 128] {
            let password: Vec<u8> = (0..len).map(|i| (i % 251 + 1) as u8).collect();
            let hidden = hide_user_password(&password, secret, &authenticator).unwrap();
            assert_eq!(hidden.len(), len.div_ceil(16) * 16);

            let padded = unhide_user_password(&hidden, secret, &authenticator).unwrap();
            assert_eq!(strip_password_padding(padded), password);
        }
    }

    #[test]
    fn test_empty_password_pads_to_one_block() {
        let hidden = hide_user_password(b"", b"s", &[1u8; 16]).unwrap();
        assert_eq!(hidden.len(), 16);
    }

    #[test]
    fn test_oversize_password_rejected() {
        let password = vec![b'a'; MAX_PASSWORD_LENGTH + 1];
        assert!(hide_user_password(&password, b"s", &[1u8; 16]).is_err());
    }

    #[test]
    fn test_unhide_rejects_bad_lengths() {
        assert!(unhide_user_password(&[], b"s", &[1u8; 16]).is_err());
        assert!(unhide_user_password(&[0u8; 15], b"s", &[1u8; 16]).is_err());
        assert!(unhide_user_password(&[0u8; 144], b"s", &[1u8; 16]).is_err());
    }

    #[test]
    fn test_response_authenticator_round_trip() {
        // code 2, id 42, length 20, zeroed authenticator, no attributes
        let mut response = vec![2u8, 42, 0, 20];
        response.extend_from_slice(&[0u8; 16]);

        let request_authenticator = [9u8; 16];
        let digest =
            calculate_response_authenticator(&response, &request_authenticator, b"secret");
        response[4..20].copy_from_slice(&digest);

        assert!(verify_response_authenticator(
            &response,
            &request_authenticator,
            b"secret"
        ));
        assert!(!verify_response_authenticator(
            &response,
            &request_authenticator,
            b"wrong"
        ));
    }
}
