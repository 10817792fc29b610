//! JSON primitives shared by the claim codecs.
//!
//! Claims decode from the raw text of their own JSON value, so composite values are split with
//! [`RawValue`] and each child is handed to its claim decoder untouched.

use std::fmt;
use std::marker::PhantomData;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserializer as _;
use serde::de::{MapAccess, Visitor};
use serde_json::value::RawValue;

use crate::error::{Error, Result};

/// First non-whitespace byte of the JSON text.
fn first_token(data: &str) -> Option<u8> {
    data.bytes().find(|b| !b.is_ascii_whitespace())
}

pub fn is_array(data: &str) -> bool {
    first_token(data) == Some(b'[')
}

pub fn is_object(data: &str) -> bool {
    first_token(data) == Some(b'{')
}

pub fn is_string(data: &str) -> bool {
    first_token(data) == Some(b'"')
}

/// Human readable name of the JSON value type, used in error messages.
pub fn describe(data: &str) -> &'static str {
    match first_token(data) {
        None => "empty input",
        Some(b'[') => "array",
        Some(b'{') => "object",
        Some(b'"') => "string",
        Some(b't' | b'f') => "boolean",
        Some(b'n') => "null",
        Some(b'-' | b'0'..=b'9') => "number",
        Some(_) => "invalid token",
    }
}

/// Splits a JSON array into the raw text of each element.
pub fn split_array(data: &str) -> Result<Vec<&RawValue>> {
    if !is_array(data) {
        return Err(Error::unexpected("array", describe(data)));
    }

    serde_json::from_str(data).map_err(Error::from)
}

struct Entries<'de> {
    _marker: PhantomData<&'de ()>,
}

impl<'de> Visitor<'de> for Entries<'de> {
    type Value = Vec<(String, &'de RawValue)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a JSON object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

        while let Some((key, value)) = map.next_entry::<String, &'de RawValue>()? {
            entries.push((key, value));
        }

        Ok(entries)
    }
}

/// Splits a JSON object into its members in document order, duplicates included.
pub fn split_object(data: &str) -> Result<Vec<(String, &RawValue)>> {
    if !is_object(data) {
        return Err(Error::unexpected("object", describe(data)));
    }

    let mut de = serde_json::Deserializer::from_str(data);

    let entries = (&mut de).deserialize_map(Entries {
        _marker: PhantomData,
    })?;

    de.end()?;

    Ok(entries)
}

/// Decodes a JSON string holding base64 (standard alphabet, padded) data.
pub fn decode_bytes(data: &str) -> Result<Vec<u8>> {
    if !is_string(data) {
        return Err(Error::unexpected("base64 string", describe(data)));
    }

    let text: String = serde_json::from_str(data)?;

    STANDARD.decode(text).map_err(Error::from)
}

pub fn encode_bytes(bytes: &[u8]) -> serde_json::Value {
    serde_json::Value::String(STANDARD.encode(bytes))
}

pub fn decode_string(data: &str) -> Result<String> {
    if !is_string(data) {
        return Err(Error::unexpected("string", describe(data)));
    }

    serde_json::from_str(data).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_first_token() {
        assert!(is_array("  [1, 2]"));
        assert!(is_object("\n{}"));
        assert!(is_string("\t\"a\""));

        assert!(!is_array(""));
        assert!(!is_array("   "));
        assert_eq!(describe("  "), "empty input");
        assert_eq!(describe("-1"), "number");
    }

    #[test]
    fn split_array_elements() {
        let items = split_array(r#"[ "a", {"b": 1} ]"#).unwrap();

        let raw: Vec<&str> = items.iter().map(|v| v.get()).collect();

        assert_eq!(raw, vec![r#""a""#, r#"{"b": 1}"#]);
    }

    #[test]
    fn split_object_keeps_duplicates() {
        let entries = split_object(r#"{"a": 1, "a": 2}"#).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[1].1.get(), "2");
    }

    #[test]
    fn split_object_rejects_trailing_data() {
        assert!(split_object(r#"{"a": 1} x"#).is_err());
    }

    #[test]
    fn base64_bytes() {
        assert_eq!(decode_bytes(r#""3q2+7w==""#).unwrap(), [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(encode_bytes(&[0xde, 0xad, 0xbe, 0xef]), "3q2+7w==");

        assert!(matches!(decode_bytes("12"), Err(Error::UnexpectedType { .. })));
        assert!(matches!(decode_bytes(r#""!!""#), Err(Error::Base64(_))));
    }
}
