use std::fmt::Debug;

use ciborium::Value;
use serde_bytes::ByteBuf;

use crate::codec::{Codec, Hex};
use crate::config::Config;
use crate::error::{Error, Result};

/// First byte of a UEID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UeidType {
    /// 128, 192 or 256 bit random number
    Rand = 1,
    /// IEEE EUI-48, EUI-60 or EUI-64
    Eui = 2,
    /// 14 digit IMEI, one digit per byte
    Imei = 3,
}

impl TryFrom<u8> for UeidType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let value = match value {
            1 => UeidType::Rand,
            2 => UeidType::Eui,
            3 => UeidType::Imei,
            _ => return Err(Error::invalid(format!("invalid UEID type {value}"))),
        };

        Ok(value)
    }
}

impl From<UeidType> for u8 {
    fn from(value: UeidType) -> Self {
        value as u8
    }
}

/// Universal Entity ID.
///
/// ```cddl
/// ueid-type = bstr .size (7..33)
/// ```
///
/// Like the nonce, the value is not checked when it's decoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ueid(ByteBuf);

impl Ueid {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let ueid = Self(ByteBuf::from(bytes.into()));

        ueid.validate()?;

        Ok(ueid)
    }

    /// Builds the UEID from its type and the identifier.
    pub fn with_type(ty: UeidType, value: &[u8]) -> Result<Self> {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.push(u8::from(ty));
        bytes.extend_from_slice(value);

        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn ueid_type(&self) -> Result<UeidType> {
        let first = self.0.first().ok_or_else(|| Error::invalid("empty UEID"))?;

        UeidType::try_from(*first)
    }

    pub fn validate(&self) -> Result<()> {
        let ty = self.ueid_type()?;
        let len = self.0.len() - 1;

        match ty {
            UeidType::Rand if !matches!(len, 16 | 24 | 32) => Err(Error::invalid(format!(
                "RAND length must be exactly 16, 24, or 32 bytes; found {len} bytes"
            ))),
            UeidType::Eui if !matches!(len, 6 | 8) => Err(Error::invalid(format!(
                "EUI length must be exactly 6 (EUI-48) or 8 (EUI-60 or EUI-64) bytes; found {len} bytes"
            ))),
            UeidType::Imei if len != 14 => Err(Error::invalid(format!(
                "IMEI length must be exactly 14 bytes; found {len} bytes"
            ))),
            UeidType::Rand | UeidType::Eui | UeidType::Imei => Ok(()),
        }
    }
}

impl Debug for Ueid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Ueid").field(&Hex::new(&self.0)).finish()
    }
}

impl Codec for Ueid {
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
