use ciborium::Value;

use super::StringOrUri;
use crate::codec::{Codec, OneOrMany};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

/// The `aud` claim.
///
/// ```cddl
/// aud-claim = (
///     aud => string-or-uri / [ 2* string-or-uri ]
/// )
/// ```
///
/// An empty audience has no encoding, so it fails to encode and an empty array fails to decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Audience(OneOrMany<StringOrUri>);

impl Audience {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_empty(self) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::invalid("empty audience"));
        }

        Ok(self)
    }

    pub fn push(&mut self, value: StringOrUri) {
        self.0.push(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StringOrUri> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StringOrUri> {
        self.0.iter()
    }
}

impl From<StringOrUri> for Audience {
    fn from(value: StringOrUri) -> Self {
        Self(OneOrMany::new(vec![value]))
    }
}

impl FromIterator<StringOrUri> for Audience {
    fn from_iter<T: IntoIterator<Item = StringOrUri>>(iter: T) -> Self {
        Self(OneOrMany::new(iter.into_iter().collect()))
    }
}

impl Codec for Audience {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        if self.is_empty() {
            return Err(Error::invalid("empty audience")).wrap_err("CBOR encoding failed");
        }

        self.0.to_cbor_value(config)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        OneOrMany::from_cbor_item(data, config)
            .map(Self)
            .and_then(Self::check_empty)
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        if self.is_empty() {
            return Err(Error::invalid("empty audience")).wrap_err("JSON encoding failed");
        }

        self.0.to_json_value(config)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        OneOrMany::from_json_str(data, config)
            .map(Self)
            .and_then(Self::check_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Uri;
    use crate::config::UriDetection;

    fn acme() -> StringOrUri {
        StringOrUri::text("% Acme Inc. %")
    }

    fn example() -> StringOrUri {
        StringOrUri::from_uri(Uri::parse("http://example.com").unwrap())
    }

    fn acme_cbor() -> Vec<u8> {
        let mut data = vec![0x6d];
        data.extend_from_slice(b"% Acme Inc. %");
        data
    }

    fn example_cbor() -> Vec<u8> {
        let mut data = vec![0xd8, 0x20, 0x72];
        data.extend_from_slice(b"http://example.com");
        data
    }

    #[test]
    fn single_audience() {
        let config = Config::new();
        let aud = Audience::from(acme());

        assert_eq!(aud.to_cbor(&config).unwrap(), acme_cbor());
        assert_eq!(aud.to_json(&config).unwrap(), r#""% Acme Inc. %""#);
        assert_eq!(Audience::from_cbor(&acme_cbor(), &config).unwrap(), aud);
    }

    #[test]
    fn multiple_audiences() {
        let config = Config::new();
        let aud: Audience = [acme(), example()].into_iter().collect();

        let mut expected = vec![0x82];
        expected.extend(acme_cbor());
        expected.extend(example_cbor());

        assert_eq!(aud.to_cbor(&config).unwrap(), expected);

        let decoded = Audience::from_cbor(&expected, &config).unwrap();
        assert_eq!(decoded.len(), 2);
        assert!(decoded.get(1).unwrap().is_uri());

        let json = aud.to_json(&config).unwrap();
        assert_eq!(json, r#"["% Acme Inc. %","http://example.com"]"#);

        let heuristic = config.with_uri_detection(UriDetection::ColonHeuristic);
        assert_eq!(Audience::from_json(&json, &heuristic).unwrap(), aud);
    }

    #[test]
    fn empty_audience() {
        let config = Config::new();
        let aud = Audience::new();

        let err = aud.to_cbor(&config).unwrap_err();
        assert_eq!(err.to_string(), "CBOR encoding failed");
        assert_eq!(err.root_cause().to_string(), "empty audience");

        let err = aud.to_json(&config).unwrap_err();
        assert_eq!(err.to_string(), "JSON encoding failed");

        assert!(Audience::from_cbor(&[0x80], &config).is_err());
        assert!(Audience::from_json("[]", &config).is_err());
    }

    #[test]
    fn single_element_array() {
        let config = Config::new();

        let mut data = vec![0x81];
        data.extend(acme_cbor());

        let aud = Audience::from_cbor(&data, &config).unwrap();

        assert_eq!(aud, Audience::from(acme()));
    }
}
