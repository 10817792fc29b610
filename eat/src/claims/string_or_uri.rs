use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use ciborium::Value;
use url::Url;

use crate::codec::{Codec, cbor, json};
use crate::config::{Config, UriDetection};
use crate::error::{Error, Result};

/// An absolute URI.
///
/// The string is kept as written, so `http://example.com` is not normalised to
/// `http://example.com/` when it's encoded again.
#[derive(Clone)]
pub struct Uri {
    raw: String,
    url: Url,
}

impl Uri {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;

        Ok(Self {
            raw: input.to_string(),
            url,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Uri {}

impl Hash for Uri {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Debug for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Uri").field(&self.raw).finish()
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Url> for Uri {
    fn from(url: Url) -> Self {
        Self {
            raw: url.as_str().to_string(),
            url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Text(String),
    Uri(Uri),
}

/// Free text or an absolute URI.
///
/// ```cddl
/// string-or-uri = tstr / uri
/// uri = #6.32(tstr)
/// ```
///
/// JSON has no URI marker, so there a URI is a plain string and whether it's read back as a URI
/// depends on [`UriDetection`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringOrUri(Repr);

impl StringOrUri {
    /// Classifies `text` according to `detection`.
    ///
    /// With [`UriDetection::ColonHeuristic`] a string containing a `:` becomes a URI when it
    /// parses as an absolute one, and stays text otherwise.
    pub fn from_text(text: &str, detection: UriDetection) -> Self {
        match detection {
            UriDetection::ColonHeuristic if text.contains(':') => Uri::parse(text)
                .map(Self::from_uri)
                .unwrap_or_else(|_| Self::text(text)),
            UriDetection::ColonHeuristic | UriDetection::Explicit => Self::text(text),
        }
    }

    /// Always stored as text.
    pub fn text(text: impl Into<String>) -> Self {
        Self(Repr::Text(text.into()))
    }

    pub fn from_uri(uri: Uri) -> Self {
        Self(Repr::Uri(uri))
    }

    pub fn is_uri(&self) -> bool {
        matches!(self.0, Repr::Uri(_))
    }

    pub fn as_uri(&self) -> Option<&Uri> {
        match &self.0 {
            Repr::Uri(uri) => Some(uri),
            Repr::Text(_) => None,
        }
    }

    /// Returns the URI, parsing the text when the value was stored as text.
    pub fn to_uri(&self) -> Result<Uri> {
        match &self.0 {
            Repr::Uri(uri) => Ok(uri.clone()),
            Repr::Text(text) => Uri::parse(text),
        }
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Text(text) => text,
            Repr::Uri(uri) => uri.as_str(),
        }
    }
}

impl From<Uri> for StringOrUri {
    fn from(value: Uri) -> Self {
        Self::from_uri(value)
    }
}

impl From<Url> for StringOrUri {
    fn from(value: Url) -> Self {
        Self::from_uri(value.into())
    }
}

impl Display for StringOrUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Codec for StringOrUri {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        match &self.0 {
            Repr::Text(text) => Ok(Value::Text(text.clone())),
            Repr::Uri(uri) => Ok(Value::Tag(
                cbor::TAG_URI,
                Box::new(Value::Text(uri.as_str().to_string())),
            )),
        }
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        match cbor::major(data) {
            Some(cbor::MAJOR_TEXT) => {
                let text: String = cbor::decode(data)?;

                Ok(Self::from_text(&text, config.uri_detection()))
            }
            Some(cbor::MAJOR_TAG) => {
                let (tag, item) = cbor::untag(data, config)?;

                if tag != cbor::TAG_URI {
                    return Err(Error::invalid(format!(
                        "must be URI (tag 32), found: {tag}"
                    )));
                }

                if !cbor::is_text(item) {
                    return Err(Error::invalid("URI tag value must be a string"));
                }

                let text: String = cbor::decode(item)?;

                Uri::parse(&text).map(Self::from_uri)
            }
            _ => Err(Error::invalid("must be a text string or a URI tag")),
        }
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::String(self.as_str().to_string()))
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let text = json::decode_string(data)?;

        Ok(Self::from_text(&text, config.uri_detection()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACME: [u8; 14] = [
        0x6d, 0x25, 0x20, 0x41, 0x63, 0x6d, 0x65, 0x20, 0x49, 0x6e, 0x63, 0x2e, 0x20, 0x25,
    ];

    fn example_uri() -> Vec<u8> {
        let mut data = vec![0xd8, 0x20, 0x72];
        data.extend_from_slice(b"http://example.com");
        data
    }

    #[test]
    fn uri_keeps_its_spelling() {
        let uri = Uri::parse("http://example.com").unwrap();

        assert_eq!(uri.as_str(), "http://example.com");
        assert_eq!(uri.as_url().as_str(), "http://example.com/");
    }

    #[test]
    fn encode_text_and_uri() {
        let config = Config::new();

        let text = StringOrUri::text("% Acme Inc. %");
        assert!(!text.is_uri());
        assert_eq!(text.to_cbor(&config).unwrap(), ACME);

        let uri = StringOrUri::from_uri(Uri::parse("http://example.com").unwrap());
        assert!(uri.is_uri());
        assert_eq!(uri.to_cbor(&config).unwrap(), example_uri());
        assert_eq!(uri.to_json(&config).unwrap(), r#""http://example.com""#);
    }

    #[test]
    fn decode_tagged_uri() {
        let config = Config::new();

        let value = StringOrUri::from_cbor(&example_uri(), &config).unwrap();

        assert!(value.is_uri());
        assert_eq!(value.to_string(), "http://example.com");

        let text = StringOrUri::from_cbor(&ACME, &config).unwrap();
        assert_eq!(text, StringOrUri::text("% Acme Inc. %"));
    }

    #[test]
    fn decode_errors() {
        let config = Config::new();

        // 33("a")
        let err = StringOrUri::from_cbor(&[0xd8, 0x21, 0x61, b'a'], &config).unwrap_err();
        assert_eq!(err.to_string(), "must be URI (tag 32), found: 33");

        // 32(1)
        let err = StringOrUri::from_cbor(&[0xd8, 0x20, 0x01], &config).unwrap_err();
        assert_eq!(err.to_string(), "URI tag value must be a string");

        let err = StringOrUri::from_cbor(&[0x01], &config).unwrap_err();
        assert_eq!(err.to_string(), "must be a text string or a URI tag");
    }

    #[test]
    fn colon_heuristic() {
        let value = StringOrUri::from_text("urn:example:device", UriDetection::ColonHeuristic);
        assert!(value.is_uri());

        let value = StringOrUri::from_text("Acme Inc.", UriDetection::ColonHeuristic);
        assert!(!value.is_uri());

        // not a valid scheme, so it stays text
        let value = StringOrUri::from_text("12:30", UriDetection::ColonHeuristic);
        assert_eq!(value, StringOrUri::text("12:30"));

        let value = StringOrUri::from_text("urn:example:device", UriDetection::Explicit);
        assert!(!value.is_uri());
        assert!(value.to_uri().is_ok());
    }

    #[test]
    fn json_detection_follows_config() {
        let data = r#""http://example.com""#;

        let text = StringOrUri::from_json(data, &Config::new()).unwrap();
        assert!(!text.is_uri());
        assert_eq!(text.as_str(), "http://example.com");

        let heuristic = Config::new().with_uri_detection(UriDetection::ColonHeuristic);
        let detected = StringOrUri::from_json(data, &heuristic).unwrap();
        assert!(detected.is_uri());
    }

    #[test]
    fn text_with_colon_round_trips() {
        let config = Config::new();

        for text in ["12:30", "note:hello", "Acme: the company"] {
            let value = StringOrUri::text(text);

            let data = value.to_cbor(&config).unwrap();
            assert_eq!(StringOrUri::from_cbor(&data, &config).unwrap(), value);

            let json = value.to_json(&config).unwrap();
            assert_eq!(StringOrUri::from_json(&json, &config).unwrap(), value);
        }

        let heuristic = config.with_uri_detection(UriDetection::ColonHeuristic);
        let value = StringOrUri::text("12:30");
        let data = value.to_cbor(&heuristic).unwrap();
        assert_eq!(StringOrUri::from_cbor(&data, &heuristic).unwrap(), value);
    }
}
