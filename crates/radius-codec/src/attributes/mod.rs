//! Attribute values and the typed-value codec.

pub mod codec;
pub mod value;

pub use codec::{decode_value, encode_value};
pub use value::AttributeValue;
