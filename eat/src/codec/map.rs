//! Map shaped claims: integer keys in CBOR, names in JSON.

use std::collections::BTreeSet;

use ciborium::Value;
use serde_json::value::RawValue;
use tracing::debug;

use super::{Codec, cbor, json};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

/// A member of a map shaped claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    pub key: i64,
    pub name: &'static str,
}

impl Field {
    pub const fn new(key: i64, name: &'static str) -> Self {
        Self { key, name }
    }
}

fn missing(field: Field) -> Error {
    Error::invalid(format!("missing required field {}", field.name))
}

/// Raw entries of a CBOR map, indexed by the known fields.
pub struct CborMap<'a> {
    entries: Vec<(Field, &'a [u8])>,
    config: Config,
}

impl<'a> CborMap<'a> {
    /// Splits the map, rejecting duplicate keys and skipping the unknown ones.
    pub fn parse(data: &'a [u8], fields: &[Field], config: &Config) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();

        for (key, value) in cbor::split_map(data, config)? {
            let Ok(key) = cbor::decode_int(key) else {
                debug!(key = %super::Hex::new(key), "skipping non integer key");

                continue;
            };

            if !seen.insert(key) {
                return Err(Error::DuplicateKey(key.to_string()));
            }

            match fields.iter().find(|field| field.key == key) {
                Some(field) => entries.push((*field, value)),
                None => debug!(key, "skipping unknown key"),
            }
        }

        Ok(Self {
            entries,
            config: *config,
        })
    }

    pub fn optional<T>(&self, field: Field) -> Result<Option<T>>
    where
        T: Codec,
    {
        self.entries
            .iter()
            .find(|(f, _)| f.key == field.key)
            .map(|(_, raw)| {
                T::from_cbor_item(raw, &self.config)
                    .wrap_err_with(|| format!("couldn't decode {}", field.name))
            })
            .transpose()
    }

    pub fn required<T>(&self, field: Field) -> Result<T>
    where
        T: Codec,
    {
        self.optional(field)?.ok_or_else(|| missing(field))
    }
}

/// Raw members of a JSON object, indexed by the known fields.
pub struct JsonMap<'a> {
    entries: Vec<(Field, &'a RawValue)>,
    config: Config,
}

impl<'a> JsonMap<'a> {
    /// Splits the object, rejecting duplicate names and skipping the unknown ones.
    pub fn parse(data: &'a str, fields: &[Field], config: &Config) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();

        for (name, value) in json::split_object(data)? {
            if seen.contains(&name) {
                return Err(Error::DuplicateKey(name));
            }

            match fields.iter().find(|field| field.name == name) {
                Some(field) => entries.push((*field, value)),
                None => debug!(name = %name, "skipping unknown member"),
            }

            seen.insert(name);
        }

        Ok(Self {
            entries,
            config: *config,
        })
    }

    pub fn optional<T>(&self, field: Field) -> Result<Option<T>>
    where
        T: Codec,
    {
        self.entries
            .iter()
            .find(|(f, _)| f.name == field.name)
            .map(|(_, raw)| {
                T::from_json_str(raw.get(), &self.config)
                    .wrap_err_with(|| format!("couldn't decode {}", field.name))
            })
            .transpose()
    }

    pub fn required<T>(&self, field: Field) -> Result<T>
    where
        T: Codec,
    {
        self.optional(field)?.ok_or_else(|| missing(field))
    }
}

/// Collects the present fields of a claim into a CBOR map, sorted by key.
pub struct CborMapBuilder<'c> {
    entries: Vec<(i64, Value)>,
    config: &'c Config,
}

impl<'c> CborMapBuilder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            entries: Vec::new(),
            config,
        }
    }

    pub fn field<T>(mut self, field: Field, value: Option<&T>) -> Result<Self>
    where
        T: Codec,
    {
        if let Some(value) = value {
            let value = value
                .to_cbor_value(self.config)
                .wrap_err_with(|| format!("couldn't encode {}", field.name))?;

            self.entries.push((field.key, value));
        }

        Ok(self)
    }

    pub fn build(mut self) -> Value {
        self.entries.sort_by_key(|(key, _)| *key);

        Value::Map(
            self.entries
                .into_iter()
                .map(|(key, value)| (Value::Integer(key.into()), value))
                .collect(),
        )
    }
}

/// Collects the present fields of a claim into a JSON object.
pub struct JsonMapBuilder<'c> {
    members: serde_json::Map<String, serde_json::Value>,
    config: &'c Config,
}

impl<'c> JsonMapBuilder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            members: serde_json::Map::new(),
            config,
        }
    }

    pub fn field<T>(mut self, field: Field, value: Option<&T>) -> Result<Self>
    where
        T: Codec,
    {
        if let Some(value) = value {
            let value = value
                .to_json_value(self.config)
                .wrap_err_with(|| format!("couldn't encode {}", field.name))?;

            self.members.insert(field.name.to_string(), value);
        }

        Ok(self)
    }

    pub fn build(self) -> serde_json::Value {
        serde_json::Value::Object(self.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Field = Field::new(1, "a");
    const B: Field = Field::new(2, "b");

    #[test]
    fn builders_sort_and_skip_missing() {
        let config = Config::new();

        let value = CborMapBuilder::new(&config)
            .field(B, Some(&String::from("x")))
            .unwrap()
            .field(A, Some(&true))
            .unwrap()
            .field::<u64>(Field::new(3, "c"), None)
            .unwrap()
            .build();

        assert_eq!(
            cbor::to_vec(&value).unwrap(),
            [0xa2, 0x01, 0xf5, 0x02, 0x61, b'x']
        );

        let value = JsonMapBuilder::new(&config)
            .field(B, Some(&String::from("x")))
            .unwrap()
            .build();

        assert_eq!(value.to_string(), r#"{"b":"x"}"#);
    }

    #[test]
    fn cbor_map_lookup() {
        let config = Config::new();
        // {1: true, 7: 0}
        let data = [0xa2, 0x01, 0xf5, 0x07, 0x00];

        let map = CborMap::parse(&data, &[A, B], &config).unwrap();

        assert!(map.required::<bool>(A).unwrap());
        assert_eq!(map.optional::<String>(B).unwrap(), None);

        let err = map.required::<String>(B).unwrap_err();
        assert_eq!(err.to_string(), "missing required field b");
    }

    #[test]
    fn cbor_map_duplicate_key() {
        let data = [0xa2, 0x01, 0xf5, 0x01, 0xf4];

        assert!(matches!(
            CborMap::parse(&data, &[A], &Config::new()),
            Err(Error::DuplicateKey(_))
        ));
    }

    #[test]
    fn json_map_lookup() {
        let config = Config::new();

        let map = JsonMap::parse(r#"{"a": true, "z": null}"#, &[A, B], &config).unwrap();
        assert!(map.required::<bool>(A).unwrap());

        assert!(matches!(
            JsonMap::parse(r#"{"a": true, "a": false}"#, &[A], &config),
            Err(Error::DuplicateKey(name)) if name == "a"
        ));
    }

    #[test]
    fn decode_error_names_the_field() {
        let map = JsonMap::parse(r#"{"a": 1}"#, &[A], &Config::new()).unwrap();

        let err = map.required::<bool>(A).unwrap_err();
        assert_eq!(err.to_string(), "couldn't decode a");
        assert!(matches!(err.root_cause(), Error::Json(_)));
    }
}
