//! FreeRADIUS-format dictionary parsing and attribute resolution.
//!
//! A dictionary is built once from a root file and its transitive
//! `$INCLUDE`s, then shared read-only by every packet parsed or serialized
//! in the session.
//!
//! The recognized subset is line-oriented: `$INCLUDE <path>` (relative to
//! the current file), `VENDOR <name> <id>` / `END-VENDOR` blocks, and
//! `ATTRIBUTE <name> <code> <type> [flags...]`. Tokens are separated by runs
//! of tabs and spaces. Everything else (comments, `VALUE` lines, blanks) is
//! ignored, and a line whose numeric token fails to parse is skipped, both
//! matching FreeRADIUS's own tolerance for the many dictionary dialects in
//! the wild. Unknown attribute type strings are stored verbatim; the
//! attribute codec decides what to do with them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CodecError;

/// A base attribute definition: `ATTRIBUTE <name> <code> <type>` outside any
/// vendor block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryAttribute {
    pub name: String,
    pub code: u8,
    /// Declared type string, e.g. `string`, `ipaddr`, `integer`. Kept
    /// verbatim even when unrecognized.
    pub attr_type: String,
}

/// A vendor-specific attribute definition from inside a `VENDOR` block.
///
/// `vendor_code` is a u8 on the wire but stored as u32, as some dictionary
/// dialects declare wider codes for extended-VSA vendors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryVendorAttribute {
    pub name: String,
    pub vendor_id: u32,
    pub vendor_code: u32,
    pub attr_type: String,
}

/// Immutable attribute dictionary with by-code and by-name indexes for base
/// attributes and a linearly scanned vendor attribute list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    by_code: HashMap<u8, DictionaryAttribute>,
    by_name: HashMap<String, DictionaryAttribute>,
    vendor_attributes: Vec<DictionaryVendorAttribute>,
}

impl Dictionary {
    /// Parse a dictionary from a root file and its transitive `$INCLUDE`s.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let mut dictionary = Dictionary::default();
        let mut vendor_context = None;
        dictionary.parse_file(path.as_ref(), &mut vendor_context)?;
        Ok(dictionary)
    }

    /// Resolve a base attribute by wire code. A miss on inbound parsing is
    /// recoverable: the attribute is logged and skipped.
    pub fn attribute_by_code(&self, code: u8) -> Option<&DictionaryAttribute> {
        self.by_code.get(&code)
    }

    /// Resolve a base attribute by name. A miss on outbound serialization is
    /// fatal: the caller cannot intend an anonymous attribute.
    pub fn attribute_by_name(&self, name: &str) -> Option<&DictionaryAttribute> {
        self.by_name.get(name)
    }

    /// Resolve a vendor attribute by `(vendor id, vendor code)`.
    pub fn vendor_attribute(
        &self,
        vendor_id: u32,
        vendor_code: u32,
    ) -> Option<&DictionaryVendorAttribute> {
        self.vendor_attributes
            .iter()
            .find(|attr| attr.vendor_id == vendor_id && attr.vendor_code == vendor_code)
    }

    /// Resolve a vendor attribute by name.
    pub fn vendor_attribute_by_name(&self, name: &str) -> Option<&DictionaryVendorAttribute> {
        self.vendor_attributes.iter().find(|attr| attr.name == name)
    }

    fn parse_file(&mut self, path: &Path, vendor: &mut Option<u32>) -> Result<(), CodecError> {
        let content = fs::read_to_string(path)?;

        for line in content.lines() {
            let tokens: Vec<&str> = line
                .split(['\t', ' '])
                .filter(|token| !token.is_empty())
                .collect();

            match tokens.as_slice() {
                ["$INCLUDE", include, ..] => {
                    let target = match path.parent() {
                        Some(dir) => dir.join(include),
                        None => PathBuf::from(include),
                    };
                    self.parse_file(&target, vendor)?;
                }
                ["$INCLUDE"] => {
                    return Err(CodecError::DictionaryParse(format!(
                        "$INCLUDE without a path in {}",
                        path.display()
                    )));
                }
                ["VENDOR", _name, id, ..] => match id.parse::<u32>() {
                    Ok(id) => *vendor = Some(id),
                    Err(_) => debug!(line, "skipping VENDOR line with unparseable id"),
                },
                ["END-VENDOR", ..] => *vendor = None,
                ["ATTRIBUTE", name, code, attr_type, ..] => {
                    self.define_attribute(*vendor, name, code, attr_type, line)
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn define_attribute(
        &mut self,
        vendor: Option<u32>,
        name: &str,
        code: &str,
        attr_type: &str,
        line: &str,
    ) {
        match vendor {
            Some(vendor_id) => match code.parse::<u32>() {
                Ok(vendor_code) => self.vendor_attributes.push(DictionaryVendorAttribute {
                    name: name.to_string(),
                    vendor_id,
                    vendor_code,
                    attr_type: attr_type.to_string(),
                }),
                Err(_) => debug!(line, "skipping vendor ATTRIBUTE with unparseable code"),
            },
            None => match code.parse::<u8>() {
                Ok(code) => {
                    let attribute = DictionaryAttribute {
                        name: name.to_string(),
                        code,
                        attr_type: attr_type.to_string(),
                    };
                    self.by_code.insert(code, attribute.clone());
                    self.by_name.insert(attribute.name.clone(), attribute);
                }
                Err(_) => debug!(line, "skipping ATTRIBUTE with unparseable code"),
            },
        }
    }
}
