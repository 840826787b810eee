use std::io;
use thiserror::Error;

/// Errors surfaced by the codec.
///
/// Packet-level conditions (`InvalidFraming`, `InvalidRequestAuthenticator`,
/// `InvalidMessageAuthenticator`, `MalformedAttribute`) abort parsing; the
/// caller should drop the datagram. Per-attribute problems during parsing are
/// logged and the attribute is skipped, so they never appear here. All
/// serialization failures are fatal to that send.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Declared length disagrees with the buffer, or the stream helper hit
    /// end-of-stream mid-packet.
    #[error("invalid framing: {0}")]
    InvalidFraming(String),

    /// Accounting/Disconnect request authenticator mismatch. Usually means
    /// the shared secret is wrong.
    #[error("request authenticator mismatch (check shared secret)")]
    InvalidRequestAuthenticator,

    /// Message-Authenticator HMAC mismatch.
    #[error("Message-Authenticator mismatch")]
    InvalidMessageAuthenticator,

    /// An attribute header claims more bytes than the packet holds.
    #[error("malformed attribute at offset {0}: extends past end of packet")]
    MalformedAttribute(usize),

    /// The dictionary does not resolve this attribute name.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The encoder has no rule mapping this value shape onto the declared
    /// dictionary type.
    #[error("cannot encode {value_kind} value as dictionary type {declared:?}")]
    UnsupportedAttributeType {
        declared: String,
        value_kind: &'static str,
    },

    /// A dictionary line that cannot be safely skipped.
    #[error("dictionary parse error: {0}")]
    DictionaryParse(String),

    /// Unrecognized packet code octet.
    #[error("invalid packet code: {0}")]
    InvalidCode(u8),

    /// Serialized packet would exceed the 16-bit length field.
    #[error("packet too large: {0} bytes")]
    PacketTooLarge(usize),

    /// Attribute value problem: oversize value, wrong wire length for the
    /// declared type, or a typed accessor used against multiple values.
    #[error("attribute error: {0}")]
    AttributeError(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
