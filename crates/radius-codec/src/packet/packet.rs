use super::Code;
use crate::attributes::AttributeValue;
use crate::auth;
use crate::error::CodecError;

/// Attribute name for Message-Authenticator (type 80, RFC 2869) in the
/// standard dictionaries.
pub const MESSAGE_AUTHENTICATOR: &str = "Message-Authenticator";

/// RADIUS packet as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
///
/// Attributes live in an insertion-ordered multi-map keyed by dictionary
/// name; repeated adds under one name append to that name's value list, and
/// insertion order is the serialization order. The shared secret is carried
/// with the packet but never serialized. A packet built with
/// [`Packet::create_response`] also retains the request's authenticator,
/// consumed during serialization to compute the Response Authenticator.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Packet type (1 byte)
    pub code: Code,
    /// Packet identifier for matching requests/responses (1 byte)
    pub identifier: u8,
    /// Authenticator (16 bytes). Random for Access-Request/Status-Server,
    /// zeroed at construction for codes whose authenticator is a digest.
    pub authenticator: [u8; 16],
    secret: Vec<u8>,
    attributes: Vec<(String, Vec<AttributeValue>)>,
    request_authenticator: Option<[u8; 16]>,
}

impl Packet {
    /// Minimum RADIUS packet size (1 code + 1 id + 2 length + 16 authenticator)
    pub const MIN_LENGTH: usize = 20;
    /// Absolute maximum packet size: the length field is 16 bits
    pub const MAX_LENGTH: usize = 65535;

    /// Create a request packet.
    ///
    /// Access-Request and Status-Server get a random authenticator with no
    /// zero bytes, drawn from a cryptographically strong RNG. Status-Server
    /// additionally gets a zeroed Message-Authenticator placeholder whose
    /// real value is computed during serialization (RFC 5997 Section 2).
    /// Other request codes start with a zeroed authenticator; the digest is
    /// filled in when the packet is serialized.
    pub fn new_request(code: Code, identifier: u8, secret: impl Into<Vec<u8>>) -> Self {
        let authenticator = match code {
            Code::AccessRequest | Code::StatusServer => auth::generate_request_authenticator(),
            _ => [0u8; 16],
        };
        let mut packet = Packet {
            code,
            identifier,
            authenticator,
            secret: secret.into(),
            attributes: Vec::new(),
            request_authenticator: None,
        };
        if code == Code::StatusServer {
            packet.add_attribute(MESSAGE_AUTHENTICATOR, AttributeValue::Octets(vec![0u8; 16]));
        }
        packet
    }

    /// Create a response to this request.
    ///
    /// The response inherits identifier and shared secret, and retains this
    /// packet's authenticator so the Response Authenticator can be computed
    /// at serialization time.
    pub fn create_response(&self, code: Code) -> Self {
        Packet {
            code,
            identifier: self.identifier,
            authenticator: [0u8; 16],
            secret: self.secret.clone(),
            attributes: Vec::new(),
            request_authenticator: Some(self.authenticator),
        }
    }

    /// Construct a packet from parsed wire fields. Attributes are appended
    /// as the codec walks the datagram.
    pub(crate) fn from_wire(
        code: Code,
        identifier: u8,
        authenticator: [u8; 16],
        secret: &[u8],
    ) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            secret: secret.to_vec(),
            attributes: Vec::new(),
            request_authenticator: None,
        }
    }

    /// Add a value under a dictionary attribute name.
    ///
    /// The name is only checked against the dictionary when the packet is
    /// serialized; an unresolvable name fails that send.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.attributes.push((name, vec![value])),
        }
    }

    /// Get the single value stored under a name.
    ///
    /// Returns `Ok(None)` when the name is absent and an error when the name
    /// holds more than one value; use [`Packet::attributes`] for multi-valued
    /// attributes.
    pub fn attribute(&self, name: &str) -> Result<Option<&AttributeValue>, CodecError> {
        match self.attributes.iter().find(|(n, _)| n == name) {
            None => Ok(None),
            Some((_, values)) if values.len() == 1 => Ok(Some(&values[0])),
            Some((_, values)) => Err(CodecError::AttributeError(format!(
                "attribute {name:?} has {} values; use the multi-value accessor",
                values.len()
            ))),
        }
    }

    /// All values stored under a name, empty if absent.
    pub fn attributes(&self, name: &str) -> &[AttributeValue] {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate `(name, values)` entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[AttributeValue])> {
        self.attributes
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// True when no attribute has been added.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Authenticator of the request this packet responds to, if any.
    pub fn request_authenticator(&self) -> Option<&[u8; 16]> {
        self.request_authenticator.as_ref()
    }
}
