use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt::{Debug, Display};

use ciborium::Value;
use coset::{CoseSign1, TaggedCborSerializable};
use serde_bytes::ByteBuf;
use tracing::trace;

use crate::codec::{Codec, Hex, cbor, json};
use crate::config::Config;
use crate::eat::Eat;
use crate::error::{Error, Result, WrapErr};

/// CWT tag (61) followed by the COSE_Sign1 tag (18).
pub const SIGNED_TOKEN_PREFIX: [u8; 3] = [0xd8, 0x3d, 0xd2];

/// CWT tag (61) alone, the COSE_Sign1 tag is written by coset.
const CWT_TAG: [u8; 2] = [0xd8, 0x3d];

/// Name of a submodule, a text string or an integer.
///
/// JSON member names are always strings, an integer name is written as its decimal form and
/// read back as an integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmodName {
    Int(i64),
    Text(String),
}

impl SubmodName {
    fn from_json_key(key: &str) -> Self {
        key.parse()
            .map(SubmodName::Int)
            .unwrap_or_else(|_| SubmodName::Text(key.to_string()))
    }

    fn from_cbor_key(data: &[u8], config: &Config) -> Result<Self> {
        match cbor::major(data) {
            Some(cbor::MAJOR_UINT | cbor::MAJOR_NINT) => cbor::decode_int(data).map(Self::Int),
            Some(cbor::MAJOR_TEXT) => String::from_cbor_item(data, config).map(Self::Text),
            _ => Err(Error::unexpected(
                "integer or text string",
                cbor::describe(data),
            )),
        }
    }

    fn to_cbor_value(&self) -> Value {
        match self {
            SubmodName::Int(int) => Value::Integer((*int).into()),
            SubmodName::Text(text) => Value::Text(text.clone()),
        }
    }
}

impl Display for SubmodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmodName::Int(int) => write!(f, "{int}"),
            SubmodName::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for SubmodName {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SubmodName {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SubmodName {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn check_prefix(bytes: &[u8]) -> Result<()> {
    if bytes.len() <= SIGNED_TOKEN_PREFIX.len() {
        return Err(Error::invalid("not enough bytes"));
    }

    if !bytes.starts_with(&SIGNED_TOKEN_PREFIX) {
        return Err(Error::invalid("CWT and COSE Sign1 tags not found"));
    }

    Ok(())
}

/// An opaque signed EAT, a tagged CWT wrapping a COSE_Sign1.
///
/// Only the tags are checked, the signature is never verified.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SignedToken(ByteBuf);

impl SignedToken {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        check_prefix(&bytes)?;

        Ok(Self(ByteBuf::from(bytes)))
    }

    pub fn from_sign1(sign1: CoseSign1) -> Result<Self> {
        let tagged = sign1.to_tagged_vec()?;

        let mut bytes = Vec::with_capacity(CWT_TAG.len() + tagged.len());
        bytes.extend_from_slice(&CWT_TAG);
        bytes.extend_from_slice(&tagged);

        Self::new(bytes)
    }

    /// Parses the COSE_Sign1 structure, without verifying it.
    pub fn to_sign1(&self) -> Result<CoseSign1> {
        let sign1 = CoseSign1::from_tagged_slice(&self.0[CWT_TAG.len()..])?;

        Ok(sign1)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for SignedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SignedToken")
            .field(&Hex::new(&self.0))
            .finish()
    }
}

/// A submodule, either its claims or a separately signed token.
///
/// ```cddl
/// submods-type = { + submod-name => eat-claims / eat-token }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Submod {
    Claims(Box<Eat>),
    Token(SignedToken),
}

impl Submod {
    /// Wraps a COSE_Sign1 in the CWT tag.
    pub fn from_sign1(sign1: CoseSign1) -> Result<Self> {
        SignedToken::from_sign1(sign1).map(Self::Token)
    }

    /// Parses the COSE_Sign1 of a signed token, without verifying it.
    pub fn sign1(&self) -> Result<CoseSign1> {
        match self {
            Submod::Token(token) => token.to_sign1(),
            Submod::Claims(_) => Err(Error::invalid("submod is a claims-set, not a signed token")),
        }
    }
}

impl From<Eat> for Submod {
    fn from(value: Eat) -> Self {
        Self::Claims(Box::new(value))
    }
}

impl From<SignedToken> for Submod {
    fn from(value: SignedToken) -> Self {
        Self::Token(value)
    }
}

impl Codec for Submod {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        match self {
            Submod::Claims(eat) => eat.to_cbor_value(config),
            Submod::Token(token) => token.0.to_cbor_value(config),
        }
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        match cbor::major(data) {
            Some(cbor::MAJOR_BYTES) => {
                trace!("submod is a signed token");

                let bytes = ByteBuf::from_cbor_item(data, config)?;

                SignedToken::new(bytes.into_vec()).map(Self::Token)
            }
            Some(cbor::MAJOR_MAP) => {
                trace!("submod is a claims-set");

                Eat::from_cbor_item(data, config).map(Self::from)
            }
            _ => Err(Error::unexpected(
                "byte string or map",
                cbor::describe(data),
            )),
        }
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        match self {
            Submod::Claims(eat) => eat.to_json_value(config),
            Submod::Token(token) => token.0.to_json_value(config),
        }
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        if json::is_string(data) {
            trace!("submod is a signed token");

            let bytes = json::decode_bytes(data)?;

            return SignedToken::new(bytes).map(Self::Token);
        }

        if json::is_object(data) {
            trace!("submod is a claims-set");

            return Eat::from_json_str(data, config).map(Self::from);
        }

        Err(Error::unexpected("string or object", json::describe(data)))
    }
}

/// The `submods` claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submods(BTreeMap<SubmodName, Submod>);

impl Submods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a submodule, replacing and returning the previous one with the same name.
    pub fn add(&mut self, name: impl Into<SubmodName>, value: impl Into<Submod>) -> Option<Submod> {
        self.0.insert(name.into(), value.into())
    }

    pub fn add_claims(&mut self, name: impl Into<SubmodName>, claims: Eat) -> Option<Submod> {
        self.add(name, claims)
    }

    /// Adds an opaque signed token, which must start with the CWT and COSE_Sign1 tags.
    pub fn add_token(
        &mut self,
        name: impl Into<SubmodName>,
        token: impl Into<Vec<u8>>,
    ) -> Result<Option<Submod>> {
        let token = SignedToken::new(token)?;

        Ok(self.add(name, token))
    }

    pub fn get(&self, name: &SubmodName) -> Option<&Submod> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubmodName, &Submod)> {
        self.0.iter()
    }
}

impl Codec for Submods {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        self.0
            .iter()
            .map(|(name, submod)| {
                let value = submod
                    .to_cbor_value(config)
                    .wrap_err_with(|| format!("couldn't encode submod {name}"))?;

                Ok((name.to_cbor_value(), value))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Map)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let mut submods = BTreeMap::new();

        for (key, value) in cbor::split_map(data, config)? {
            let name = SubmodName::from_cbor_key(key, config).wrap_err("invalid submod name")?;

            let submod = Submod::from_cbor_item(value, config)
                .wrap_err_with(|| format!("couldn't decode submod {name}"))?;

            match submods.entry(name) {
                Entry::Vacant(entry) => {
                    entry.insert(submod);
                }
                Entry::Occupied(entry) => {
                    return Err(Error::DuplicateKey(entry.key().to_string()));
                }
            }
        }

        Ok(Self(submods))
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        let mut members = serde_json::Map::new();

        for (name, submod) in &self.0 {
            let value = submod
                .to_json_value(config)
                .wrap_err_with(|| format!("couldn't encode submod {name}"))?;

            if members.insert(name.to_string(), value).is_some() {
                return Err(Error::DuplicateKey(name.to_string()));
            }
        }

        Ok(serde_json::Value::Object(members))
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let mut submods = BTreeMap::new();

        for (key, value) in json::split_object(data)? {
            let name = SubmodName::from_json_key(&key);

            let submod = Submod::from_json_str(value.get(), config)
                .wrap_err_with(|| format!("couldn't decode submod {name}"))?;

            if submods.insert(name, submod).is_some() {
                return Err(Error::DuplicateKey(key));
            }
        }

        Ok(Self(submods))
    }
}
