use std::fmt::Display;

use ciborium::Value;

use crate::codec::{Codec, cbor, json};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

/// Version scheme of a version string, from the CoSWID registry.
///
/// ```cddl
/// $version-scheme /= multipartnumeric / multipartnumeric-suffix / alphanumeric / decimal / semver / int / text
/// multipartnumeric = 1
/// multipartnumeric-suffix = 2
/// alphanumeric = 3
/// decimal = 4
/// semver = 16384
/// ```
///
/// Unknown codes are kept as is. They encode fine in CBOR, but have no JSON name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionScheme(i64);

const SCHEME_NAMES: [(i64, &str); 5] = [
    (1, "multipartnumeric"),
    (2, "multipartnumeric-suffix"),
    (3, "alphanumeric"),
    (4, "decimal"),
    (16384, "semver"),
];

impl VersionScheme {
    pub const MULTIPART_NUMERIC: Self = Self(1);
    pub const MULTIPART_NUMERIC_SUFFIX: Self = Self(2);
    pub const ALPHANUMERIC: Self = Self(3);
    pub const DECIMAL: Self = Self(4);
    pub const SEMVER: Self = Self(16384);

    pub const fn new(code: i64) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> i64 {
        self.0
    }

    pub fn name(&self) -> Option<&'static str> {
        SCHEME_NAMES
            .iter()
            .find_map(|(code, name)| (*code == self.0).then_some(*name))
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SCHEME_NAMES
            .iter()
            .find_map(|(code, n)| (*n == name).then_some(Self(*code)))
    }
}

impl From<i64> for VersionScheme {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for VersionScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Codec for VersionScheme {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Integer(self.0.into()))
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        cbor::decode_int(data).map(Self)
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        self.name()
            .map(|name| serde_json::Value::String(name.to_string()))
            .ok_or_else(|| Error::invalid(format!("unknown version scheme {}", self.0)))
    }

    /// Accepts the scheme name or its integer code.
    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        if json::is_string(data) {
            let name = json::decode_string(data)?;

            return Self::from_name(&name)
                .ok_or_else(|| Error::invalid(format!("unknown version scheme {name:?}")));
        }

        let number: serde_json::Number = serde_json::from_str(data)?;

        number
            .as_i64()
            .map(Self)
            .ok_or_else(|| Error::invalid(format!("version scheme must be an integer, found {number}")))
    }
}

/// ```cddl
/// version-type = [
///     version: tstr,
///     ? scheme: $version-scheme
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    version: String,
    scheme: Option<VersionScheme>,
}

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            scheme: None,
        }
    }

    pub fn with_scheme(version: impl Into<String>, scheme: VersionScheme) -> Self {
        Self {
            version: version.into(),
            scheme: Some(scheme),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn scheme(&self) -> Option<VersionScheme> {
        self.scheme
    }
}

fn check_len(len: usize) -> Result<()> {
    if !(1..=2).contains(&len) {
        return Err(Error::invalid(format!(
            "a version must have 1 or 2 elements, found {len}"
        )));
    }

    Ok(())
}

impl Codec for Version {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        let mut items = vec![Value::Text(self.version.clone())];

        if let Some(scheme) = &self.scheme {
            items.push(scheme.to_cbor_value(config)?);
        }

        Ok(Value::Array(items))
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let items = cbor::split_array(data, config)?;

        check_len(items.len())?;

        let version = String::from_cbor_item(items[0], config).wrap_err("invalid version")?;

        let scheme = items
            .get(1)
            .map(|item| VersionScheme::from_cbor_item(item, config))
            .transpose()
            .wrap_err("invalid version scheme")?;

        Ok(Self { version, scheme })
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        let mut items = vec![serde_json::Value::String(self.version.clone())];

        if let Some(scheme) = &self.scheme {
            items.push(scheme.to_json_value(config)?);
        }

        Ok(serde_json::Value::Array(items))
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let items = json::split_array(data)?;

        check_len(items.len())?;

        let version = String::from_json_str(items[0].get(), config).wrap_err("invalid version")?;

        let scheme = items
            .get(1)
            .map(|item| VersionScheme::from_json_str(item.get(), config))
            .transpose()
            .wrap_err("invalid version scheme")?;

        Ok(Self { version, scheme })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_names() {
        assert_eq!(VersionScheme::SEMVER.name(), Some("semver"));
        assert_eq!(
            VersionScheme::from_name("multipartnumeric-suffix"),
            Some(VersionScheme::MULTIPART_NUMERIC_SUFFIX)
        );
        assert_eq!(VersionScheme::new(5).name(), None);
        assert_eq!(VersionScheme::from_name("unknown"), None);
    }

    #[test]
    fn unknown_scheme() {
        let config = Config::new();
        let scheme = VersionScheme::new(5);

        assert_eq!(scheme.to_cbor(&config).unwrap(), [0x05]);

        let err = scheme.to_json(&config).unwrap_err();
        assert_eq!(err.to_string(), "unknown version scheme 5");
    }

    #[test]
    fn scheme_from_json() {
        let config = Config::new();

        for (data, code) in [
            (r#""multipartnumeric""#, 1),
            (r#""semver""#, 16384),
            ("1", 1),
            ("-1", -1),
            ("0", 0),
        ] {
            assert_eq!(VersionScheme::from_json(data, &config).unwrap().code(), code);
        }

        assert!(VersionScheme::from_json("1.2", &config).is_err());
        assert!(VersionScheme::from_json(r#""foo""#, &config).is_err());
    }

    #[test]
    fn version_cbor() {
        let config = Config::new();

        let version = Version::new("1.3.4");
        let data = [0x81, 0x65, 0x31, 0x2e, 0x33, 0x2e, 0x34];
        assert_eq!(version.to_cbor(&config).unwrap(), data);
        assert_eq!(Version::from_cbor(&data, &config).unwrap(), version);

        let version = Version::with_scheme("1.3.4", VersionScheme::MULTIPART_NUMERIC);
        let data = [0x82, 0x65, 0x31, 0x2e, 0x33, 0x2e, 0x34, 0x01];
        assert_eq!(version.to_cbor(&config).unwrap(), data);
        assert_eq!(Version::from_cbor(&data, &config).unwrap(), version);
    }

    #[test]
    fn version_cbor_errors() {
        let config = Config::new();

        // []
        assert!(Version::from_cbor(&[0x80], &config).is_err());
        // ["1.3.4", 1, 1]
        assert!(
            Version::from_cbor(&[0x83, 0x65, 0x31, 0x2e, 0x33, 0x2e, 0x34, 0x01, 0x01], &config)
                .is_err()
        );
        // ["1.3.4", h'01']
        assert!(
            Version::from_cbor(&[0x82, 0x65, 0x31, 0x2e, 0x33, 0x2e, 0x34, 0x41, 0x01], &config)
                .is_err()
        );
        // [134]
        assert!(Version::from_cbor(&[0x81, 0x18, 0x86], &config).is_err());
    }

    #[test]
    fn version_json() {
        let config = Config::new();

        let version = Version::with_scheme("1.3.4", VersionScheme::MULTIPART_NUMERIC);
        let json = version.to_json(&config).unwrap();

        assert_eq!(json, r#"["1.3.4","multipartnumeric"]"#);
        assert_eq!(Version::from_json(&json, &config).unwrap(), version);

        assert_eq!(
            Version::from_json(r#"["1.3.4", 1]"#, &config).unwrap(),
            version
        );
        assert!(Version::from_json("[]", &config).is_err());
        assert!(Version::from_json(r#"["1.3.4", "x"]"#, &config).is_err());
        assert!(Version::from_json(r#""1.3.4""#, &config).is_err());
    }
}
