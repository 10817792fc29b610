use std::fmt::Display;
use std::str::FromStr;

use ciborium::Value;
use der::asn1::AnyRef;
use der::{Decode, Encode, Header, Tag};
use serde_bytes::ByteBuf;

use super::Uri;
use super::oid::{Oid, parse_arcs};
use crate::codec::{Codec, cbor, json};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

/// Minimum number of arcs of a profile OID.
pub const MIN_OID_ARCS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Uri(Uri),
    Oid(Oid),
}

/// The `eat-profile` claim.
///
/// ```cddl
/// profile-claim = (
///     profile => general-uri / general-oid
/// )
/// general-oid = oid / tagged-oid
/// ```
///
/// The OID is encoded as a byte string holding only the content octets of its DER encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile(Repr);

impl Profile {
    /// Parses an absolute URI, or a dotted-decimal OID with at least three arcs.
    pub fn from_string(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::invalid("no valid URI or OID: empty string"));
        }

        if let Ok(uri) = Uri::parse(input) {
            return Ok(Self(Repr::Uri(uri)));
        }

        parse_arcs(input)
            .and_then(|arcs| {
                check_arcs(arcs.len())?;

                Oid::from_arcs(arcs)
            })
            .map(|oid| Self(Repr::Oid(oid)))
            .wrap_err("no valid URI or OID")
    }

    pub fn from_uri(uri: Uri) -> Self {
        Self(Repr::Uri(uri))
    }

    pub fn from_oid(oid: Oid) -> Result<Self> {
        check_arcs(oid.arcs().len())?;

        Ok(Self(Repr::Oid(oid)))
    }

    pub fn is_uri(&self) -> bool {
        matches!(self.0, Repr::Uri(_))
    }

    pub fn is_oid(&self) -> bool {
        matches!(self.0, Repr::Oid(_))
    }

    pub fn as_uri(&self) -> Option<&Uri> {
        match &self.0 {
            Repr::Uri(uri) => Some(uri),
            Repr::Oid(_) => None,
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match &self.0 {
            Repr::Oid(oid) => Some(oid),
            Repr::Uri(_) => None,
        }
    }

    /// The URI, or the OID in dotted-decimal notation.
    pub fn get(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Uri(uri) => Display::fmt(uri, f),
            Repr::Oid(oid) => Display::fmt(oid, f),
        }
    }
}

fn check_arcs(arcs: usize) -> Result<()> {
    if arcs < MIN_OID_ARCS {
        return Err(Error::invalid(format!(
            "OID must have at least {MIN_OID_ARCS} arcs, found {arcs}"
        )));
    }

    Ok(())
}

/// Content octets of the DER encoding of `oid`, without the tag and length.
pub fn oid_value_bytes(oid: &Oid) -> Result<Vec<u8>> {
    let der = oid.to_der()?;

    let header = Header::from_der(&der)?;
    let header_len = usize::try_from(header.encoded_len()?)?;

    der.get(header_len..)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| Error::invalid("OID encoding is too short"))
}

/// Rebuilds the DER header in front of the content octets and parses the OID.
pub fn oid_from_value_bytes(value: &[u8]) -> Result<Oid> {
    let der = AnyRef::new(Tag::ObjectIdentifier, value)?.to_der()?;

    Oid::from_der(&der)
}

impl Codec for Profile {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        match &self.0 {
            Repr::Uri(uri) => Ok(Value::Text(uri.as_str().to_string())),
            Repr::Oid(oid) => oid_value_bytes(oid).map(Value::Bytes),
        }
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        match cbor::major(data) {
            Some(cbor::MAJOR_TEXT) => {
                let text = String::from_cbor_item(data, config)?;

                Uri::parse(&text)
                    .map(Self::from_uri)
                    .wrap_err("profile URI must be absolute")
            }
            Some(cbor::MAJOR_BYTES) => {
                let bytes = ByteBuf::from_cbor_item(data, config)?;

                let oid = oid_from_value_bytes(&bytes).wrap_err("invalid profile OID")?;

                Self::from_oid(oid)
            }
            _ => Err(Error::unexpected(
                "text string or byte string",
                cbor::describe(data),
            )),
        }
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::String(self.to_string()))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        let text = json::decode_string(data)?;

        Self::from_string(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_needs_three_arcs() {
        let err = Profile::from_string("56.78").unwrap_err();
        assert_eq!(err.to_string(), "no valid URI or OID");
        assert_eq!(
            err.root_cause().to_string(),
            "OID must have at least 3 arcs, found 2"
        );

        let profile = Profile::from_string("1.2.3").unwrap();
        assert!(profile.is_oid());
        assert_eq!(profile.get(), "1.2.3");
    }

    #[test]
    fn invalid_inputs() {
        assert!(Profile::from_string("").is_err());
        assert!(Profile::from_string("1.2.x").is_err());
        assert!(Profile::from_string("1..2.3").is_err());
        assert!(Profile::from_string("1.2.-3").is_err());
        assert!(Profile::from_string("3.2.1").is_err());
        assert!(Profile::from_string("1.2.18446744073709551616").is_err());
        assert!(Profile::from_string("/relative/path").is_err());
    }

    #[test]
    fn oid_stripped_encoding() {
        let config = Config::new();
        let profile = Profile::from_string("2.5.2.8192").unwrap();

        assert_eq!(
            profile.to_cbor(&config).unwrap(),
            [0x44, 0x55, 0x02, 0xc0, 0x00]
        );
        assert_eq!(profile.to_json(&config).unwrap(), r#""2.5.2.8192""#);

        let decoded = Profile::from_cbor(&[0x44, 0x55, 0x02, 0xc0, 0x00], &config).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn oid_value_bytes_round_trip() {
        let oid: Oid = "1.3.6.1.4.1.51324.1".parse().unwrap();

        let bytes = oid_value_bytes(&oid).unwrap();
        assert_eq!(bytes, oid.to_value_bytes());
        assert_eq!(oid_from_value_bytes(&bytes).unwrap(), oid);
    }

    #[test]
    fn long_form_lengths() {
        // 130 content octets, DER header 06 81 82
        let mut short = vec![0x2b];
        short.extend([0x01; 129]);

        let oid = oid_from_value_bytes(&short).unwrap();
        assert_eq!(oid.arcs().len(), 131);
        assert_eq!(&oid.to_der().unwrap()[..3], [0x06, 0x81, 0x82]);
        assert_eq!(oid_value_bytes(&oid).unwrap(), short);

        // 300 content octets, DER header 06 82 01 2c
        let mut long = vec![0x2b];
        long.extend([0x01; 299]);

        let oid = oid_from_value_bytes(&long).unwrap();
        assert_eq!(&oid.to_der().unwrap()[..4], [0x06, 0x82, 0x01, 0x2c]);
        assert_eq!(oid_value_bytes(&oid).unwrap(), long);
    }

    #[test]
    fn long_oid_profile() {
        let config = Config::new();

        let dotted = std::iter::once("1.3")
            .chain(std::iter::repeat_n("4294967295", 40))
            .collect::<Vec<_>>()
            .join(".");
        let profile = Profile::from_string(&dotted).unwrap();
        assert_eq!(profile.get(), dotted);

        let data = profile.to_cbor(&config).unwrap();
        // byte string of 201 octets: 1 for "1.3" and 5 per arc
        assert_eq!(&data[..2], [0x58, 0xc9]);
        assert_eq!(Profile::from_cbor(&data, &config).unwrap(), profile);

        let json = profile.to_json(&config).unwrap();
        assert_eq!(Profile::from_json(&json, &config).unwrap(), profile);
    }

    #[test]
    fn decoded_oid_needs_three_arcs() {
        // 1.2
        assert!(Profile::from_cbor(&[0x41, 0x2a], &Config::new()).is_err());
        assert!(Profile::from_cbor(&[0x40], &Config::new()).is_err());
    }

    #[test]
    fn uri_profile() {
        let config = Config::new();
        let profile = Profile::from_string("http://example.com").unwrap();

        assert!(profile.is_uri());

        let mut expected = vec![0x72];
        expected.extend_from_slice(b"http://example.com");

        assert_eq!(profile.to_cbor(&config).unwrap(), expected);
        assert_eq!(Profile::from_cbor(&expected, &config).unwrap(), profile);

        let json = profile.to_json(&config).unwrap();
        assert_eq!(json, r#""http://example.com""#);
        assert_eq!(Profile::from_json(&json, &config).unwrap(), profile);
    }

    #[test]
    fn relative_uri_is_rejected() {
        let mut data = vec![0x64];
        data.extend_from_slice(b"/foo");

        let err = Profile::from_cbor(&data, &Config::new()).unwrap_err();
        assert_eq!(err.to_string(), "profile URI must be absolute");
        assert_eq!(err.chain().count(), 2);
    }
}
