//! Encoding and decoding of claims in CBOR and JSON.

use std::fmt::{Debug, Display};
use std::ops::Deref;

use ciborium::Value;
use serde_bytes::ByteBuf;

use crate::config::Config;
use crate::error::{Error, Result};

pub mod cbor;
pub mod json;
pub mod map;

/// A claim value that has both a CBOR and a JSON representation.
///
/// Encoding builds a value tree, decoding receives the raw encoded item so the implementation can
/// look at its shape before choosing how to read it.
pub trait Codec: Sized {
    fn to_cbor_value(&self, config: &Config) -> Result<Value>;

    /// Decodes from exactly one well formed CBOR item.
    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self>;

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value>;

    /// Decodes from the text of a single JSON value.
    fn from_json_str(data: &str, config: &Config) -> Result<Self>;

    fn to_cbor(&self, config: &Config) -> Result<Vec<u8>> {
        cbor::to_vec(&self.to_cbor_value(config)?)
    }

    fn from_cbor(data: &[u8], config: &Config) -> Result<Self> {
        let item = cbor::single(data, config)?;

        Self::from_cbor_item(item, config)
    }

    fn to_json(&self, config: &Config) -> Result<String> {
        serde_json::to_string(&self.to_json_value(config)?).map_err(Error::from)
    }

    fn from_json(data: &str, config: &Config) -> Result<Self> {
        Self::from_json_str(data, config)
    }
}

impl Codec for String {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        if !cbor::is_text(data) {
            return Err(Error::unexpected("text string", cbor::describe(data)));
        }

        cbor::decode(data)
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::String(self.clone()))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        json::decode_string(data)
    }
}

impl Codec for bool {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        match data {
            [0xf4] => Ok(false),
            [0xf5] => Ok(true),
            _ => Err(Error::unexpected("boolean", cbor::describe(data))),
        }
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Bool(*self))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        serde_json::from_str(data).map_err(Error::from)
    }
}

impl Codec for u64 {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Integer((*self).into()))
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        if cbor::major(data) != Some(cbor::MAJOR_UINT) {
            return Err(Error::unexpected("unsigned integer", cbor::describe(data)));
        }

        cbor::decode(data)
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::from(*self))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        serde_json::from_str(data).map_err(Error::from)
    }
}

impl Codec for i64 {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Integer((*self).into()))
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        cbor::decode_int(data)
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::from(*self))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        serde_json::from_str(data).map_err(Error::from)
    }
}

/// Byte strings are a CBOR bstr and a base64 JSON string.
impl Codec for ByteBuf {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Bytes(self.to_vec()))
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        if !cbor::is_bytes(data) {
            return Err(Error::unexpected("byte string", cbor::describe(data)));
        }

        cbor::decode(data)
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(json::encode_bytes(self))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        json::decode_bytes(data).map(ByteBuf::from)
    }
}

/// Always an array, regardless of the number of elements.
impl<T> Codec for Vec<T>
where
    T: Codec,
{
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        self.iter()
            .map(|item| item.to_cbor_value(config))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        cbor::split_array(data, config)?
            .into_iter()
            .map(|item| T::from_cbor_item(item, config))
            .collect()
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        self.iter()
            .map(|item| item.to_json_value(config))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        json::split_array(data)?
            .into_iter()
            .map(|item| T::from_json_str(item.get(), config))
            .collect()
    }
}

/// A claim that is a single value when there is one element, and an array otherwise.
///
/// ```cddl
/// claim = value / [ 2* value ]
/// ```
///
/// A one element array is accepted when decoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OneOrMany<T>(Vec<T>);

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    pub fn push(&mut self, value: T) {
        self.0.push(value);
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for OneOrMany<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Codec for OneOrMany<T>
where
    T: Codec,
{
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        match self.0.as_slice() {
            [single] => single.to_cbor_value(config),
            _ => self.0.to_cbor_value(config),
        }
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        if cbor::is_array(data) {
            return Vec::from_cbor_item(data, config).map(Self);
        }

        T::from_cbor_item(data, config).map(|value| Self(vec![value]))
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        match self.0.as_slice() {
            [single] => single.to_json_value(config),
            _ => self.0.to_json_value(config),
        }
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        if json::is_array(data) {
            return Vec::from_json_str(data, config).map(Self);
        }

        T::from_json_str(data, config).map(|value| Self(vec![value]))
    }
}

/// Lower case hexadecimal rendering of a byte slice.
pub struct Hex<'a>(&'a [u8]);

impl<'a> Hex<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl Debug for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}

impl Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
