use ciborium::Value;
use serde_bytes::ByteBuf;

use super::Version;
use crate::codec::map::{CborMap, CborMapBuilder, Field, JsonMap, JsonMapBuilder};
use crate::codec::{Codec, Hex, cbor, json};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

const ID: Field = Field::new(1, "id");
const MEASUREMENT: Field = Field::new(2, "measurement");
const SIGNERS: Field = Field::new(3, "signers");
const FLAGS: Field = Field::new(4, "flags");
const RAW_MEASUREMENT: Field = Field::new(5, "raw-measurement");

const FIELDS: [Field; 5] = [ID, MEASUREMENT, SIGNERS, FLAGS, RAW_MEASUREMENT];

fn split_cbor_pair<'a>(data: &'a [u8], what: &str, config: &Config) -> Result<Vec<&'a [u8]>> {
    let items = cbor::split_array(data, config)?;

    if !(1..=2).contains(&items.len()) {
        return Err(Error::invalid(format!(
            "{what} must have 1 or 2 elements, found {}",
            items.len()
        )));
    }

    Ok(items)
}

/// ```cddl
/// component-id = [
///     name:     tstr,
///     ? version: version-type
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentId {
    pub name: String,
    pub version: Option<Version>,
}

impl ComponentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }
}

impl Codec for ComponentId {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        let mut items = vec![self.name.to_cbor_value(config)?];

        if let Some(version) = &self.version {
            items.push(version.to_cbor_value(config)?);
        }

        Ok(Value::Array(items))
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let items = split_cbor_pair(data, "a component id", config)?;

        Ok(Self {
            name: String::from_cbor_item(items[0], config).wrap_err("invalid component name")?,
            version: items
                .get(1)
                .map(|item| Version::from_cbor_item(item, config))
                .transpose()?,
        })
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        let mut items = vec![self.name.to_json_value(config)?];

        if let Some(version) = &self.version {
            items.push(version.to_json_value(config)?);
        }

        Ok(serde_json::Value::Array(items))
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let items = json::split_array(data)?;

        if !(1..=2).contains(&items.len()) {
            return Err(Error::invalid(format!(
                "a component id must have 1 or 2 elements, found {}",
                items.len()
            )));
        }

        Ok(Self {
            name: String::from_json_str(items[0].get(), config)
                .wrap_err("invalid component name")?,
            version: items
                .get(1)
                .map(|item| Version::from_json_str(item.get(), config))
                .transpose()?,
        })
    }
}

/// A digest and the IANA named information algorithm that produced it.
///
/// ```cddl
/// hash-entry = [
///     hash-alg-id: int,
///     hash-value: bytes,
/// ]
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HashEntry {
    pub alg: i64,
    pub value: ByteBuf,
}

impl HashEntry {
    pub const SHA_256: i64 = 1;
    pub const SHA_384: i64 = 7;
    pub const SHA_512: i64 = 8;

    pub fn new(alg: i64, value: impl Into<Vec<u8>>) -> Self {
        Self {
            alg,
            value: ByteBuf::from(value.into()),
        }
    }
}

impl std::fmt::Debug for HashEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashEntry")
            .field("alg", &self.alg)
            .field("value", &Hex::new(&self.value))
            .finish()
    }
}

impl Codec for HashEntry {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        Ok(Value::Array(vec![
            self.alg.to_cbor_value(config)?,
            self.value.to_cbor_value(config)?,
        ]))
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let items = cbor::split_array(data, config)?;

        let [alg, value] = items.as_slice() else {
            return Err(Error::invalid(format!(
                "a hash entry must have 2 elements, found {}",
                items.len()
            )));
        };

        Ok(Self {
            alg: i64::from_cbor_item(alg, config)?,
            value: ByteBuf::from_cbor_item(value, config)?,
        })
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Array(vec![
            self.alg.to_json_value(config)?,
            self.value.to_json_value(config)?,
        ]))
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let items = json::split_array(data)?;

        let [alg, value] = items.as_slice() else {
            return Err(Error::invalid(format!(
                "a hash entry must have 2 elements, found {}",
                items.len()
            )));
        };

        Ok(Self {
            alg: i64::from_json_str(alg.get(), config)?,
            value: ByteBuf::from_json_str(value.get(), config)?,
        })
    }
}

/// A measured software or firmware component.
///
/// ```cddl
/// measured-component = {
///     id => component-id,
///     ? measurement => hash-entry,
///     ? signers => [* bstr],
///     ? flags => bstr,
///     ? raw-measurement => bstr
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasuredComponent {
    pub id: ComponentId,
    pub measurement: Option<HashEntry>,
    pub signers: Option<Vec<ByteBuf>>,
    pub flags: Option<ByteBuf>,
    pub raw_measurement: Option<ByteBuf>,
}

impl MeasuredComponent {
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            measurement: None,
            signers: None,
            flags: None,
            raw_measurement: None,
        }
    }
}

impl Codec for MeasuredComponent {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        let value = CborMapBuilder::new(config)
            .field(ID, Some(&self.id))?
            .field(MEASUREMENT, self.measurement.as_ref())?
            .field(SIGNERS, self.signers.as_ref())?
            .field(FLAGS, self.flags.as_ref())?
            .field(RAW_MEASUREMENT, self.raw_measurement.as_ref())?
            .build();

        Ok(value)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let map = CborMap::parse(data, &FIELDS, config)?;

        Ok(Self {
            id: map.required(ID)?,
            measurement: map.optional(MEASUREMENT)?,
            signers: map.optional(SIGNERS)?,
            flags: map.optional(FLAGS)?,
            raw_measurement: map.optional(RAW_MEASUREMENT)?,
        })
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        let value = JsonMapBuilder::new(config)
            .field(ID, Some(&self.id))?
            .field(MEASUREMENT, self.measurement.as_ref())?
            .field(SIGNERS, self.signers.as_ref())?
            .field(FLAGS, self.flags.as_ref())?
            .field(RAW_MEASUREMENT, self.raw_measurement.as_ref())?
            .build();

        Ok(value)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let map = JsonMap::parse(data, &FIELDS, config)?;

        Ok(Self {
            id: map.required(ID)?,
            measurement: map.optional(MEASUREMENT)?,
            signers: map.optional(SIGNERS)?,
            flags: map.optional(FLAGS)?,
            raw_measurement: map.optional(RAW_MEASUREMENT)?,
        })
    }
}
