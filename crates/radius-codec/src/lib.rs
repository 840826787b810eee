//! RADIUS Protocol Codec
//!
//! This crate implements the wire-format core of the RADIUS protocol as
//! defined in RFC 2865, 2866, 2869 and 5176: parsing datagrams into
//! structured packets, serializing packets with correct authenticators,
//! User-Password hiding, Message-Authenticator integrity, and attribute
//! resolution driven by FreeRADIUS-format dictionary files.
//!
//! The codec is purely computational. Transport (UDP sockets, TCP streams),
//! authentication backends and retry policy belong to the host; the host
//! supplies shared secrets and a dictionary, and gets back packets or typed
//! errors.
//!
//! # Example
//!
//! ```rust
//! use radius_codec::{codec, AttributeValue, Code, Dictionary, Packet};
//! use std::net::Ipv4Addr;
//!
//! # fn main() -> Result<(), radius_codec::CodecError> {
//! let dictionary = Dictionary::from_file(concat!(
//!     env!("CARGO_MANIFEST_DIR"),
//!     "/tests/dictionaries/dictionary"
//! ))?;
//!
//! // Build an Access-Request; the authenticator is generated here and the
//! // User-Password is hidden against it during serialization.
//! let mut request = Packet::new_request(Code::AccessRequest, 1, "xyzzy5461");
//! request.add_attribute("User-Name", AttributeValue::from("nemo"));
//! request.add_attribute("User-Password", AttributeValue::from("arctangent"));
//! request.add_attribute(
//!     "NAS-IP-Address",
//!     AttributeValue::from(Ipv4Addr::new(192, 168, 1, 16)),
//! );
//! let datagram = codec::serialize(&request, &dictionary)?;
//!
//! // Parse it back; integrity checks run here.
//! let parsed = codec::parse(&dictionary, b"xyzzy5461", &datagram)?;
//! assert_eq!(parsed.identifier, 1);
//! # Ok(())
//! # }
//! ```

pub mod accounting;
pub mod attributes;
pub mod auth;
pub mod chap;
pub mod codec;
pub mod dictionary;
pub mod error;
pub mod message_auth;
pub mod packet;

pub use accounting::{AcctAuthentic, AcctStatusType, AcctTerminateCause};
pub use attributes::AttributeValue;
pub use auth::{
    calculate_request_authenticator, calculate_response_authenticator,
    generate_request_authenticator, hide_user_password, unhide_user_password,
    verify_response_authenticator,
};
pub use chap::{compute_chap_response, verify_chap_response, verify_packet_chap};
pub use codec::{parse, read_packet, serialize};
pub use dictionary::{Dictionary, DictionaryAttribute, DictionaryVendorAttribute};
pub use error::CodecError;
pub use message_auth::{calculate_message_authenticator, verify_message_authenticator};
pub use packet::{Code, Packet};
