use std::fmt::Debug;

use ciborium::Value;
use serde_bytes::ByteBuf;

use crate::codec::{Codec, Hex, OneOrMany, cbor};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

pub const MIN_NONCE_SIZE: usize = 8;
pub const MAX_NONCE_SIZE: usize = 64;

/// ```cddl
/// nonce-type = bstr .size (8..64)
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(ByteBuf);

impl Nonce {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let nonce = Self(ByteBuf::from(bytes.into()));

        nonce.validate()?;

        Ok(nonce)
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text).wrap_err("decoding nonce failed")?;

        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn validate(&self) -> Result<()> {
        let found = self.0.len();

        if !(MIN_NONCE_SIZE..=MAX_NONCE_SIZE).contains(&found) {
            return Err(Error::NonceLength { found });
        }

        Ok(())
    }
}

impl Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Nonce").field(&Hex::new(&self.0)).finish()
    }
}

/// Decoding doesn't check the length, call [`Nonce::validate`] for that.
impl Codec for Nonce {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        self.0.to_cbor_value(config)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        ByteBuf::from_cbor_item(data, config).map(Self)
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        self.0.to_json_value(config)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        ByteBuf::from_json_str(data, config).map(Self)
    }
}

/// The `nonce` claim.
///
/// ```cddl
/// nonce-claim = (
///     nonce => nonce-type / [ 2* nonce-type ]
/// )
/// ```
///
/// The claim is validated every time it's encoded, but not when it's decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Nonces(OneOrMany<Nonce>);

impl Nonces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a nonce, failing if it isn't between 8 and 64 bytes.
    pub fn push(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.0.push(Nonce::new(bytes)?);

        Ok(())
    }

    pub fn push_hex(&mut self, text: &str) -> Result<()> {
        self.0.push(Nonce::from_hex(text)?);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Nonce> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nonce> {
        self.0.iter()
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::invalid("empty nonce"));
        }

        for (i, nonce) in self.0.iter().enumerate() {
            nonce
                .validate()
                .wrap_err_with(|| format!("found invalid nonce at index {i}"))?;
        }

        Ok(())
    }
}

impl From<Nonce> for Nonces {
    fn from(value: Nonce) -> Self {
        Self(OneOrMany::new(vec![value]))
    }
}

impl Codec for Nonces {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        self.validate().wrap_err("CBOR encoding failed")?;

        self.0.to_cbor_value(config)
    }

    fn from_cbor(data: &[u8], config: &Config) -> Result<Self> {
        let item = cbor::single(data, config).wrap_err("CBOR decoding failed for nonce")?;

        Self::from_cbor_item(item, config)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        OneOrMany::from_cbor_item(data, config)
            .map(Self)
            .wrap_err("CBOR decoding failed for nonce")
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        self.validate().wrap_err("JSON encoding failed")?;

        self.0.to_json_value(config)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        OneOrMany::from_json_str(data, config)
            .map(Self)
            .wrap_err("JSON decoding failed for nonce")
    }
}
