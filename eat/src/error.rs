//! Errors returned by the claim codecs.

use std::fmt::Display;

use crate::claims::nonce::{MAX_NONCE_SIZE, MIN_NONCE_SIZE};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("unexpected EOF")]
    UnexpectedEof,
    #[error("{0} bytes of trailing data")]
    TrailingData(usize),
    #[error("malformed CBOR: {0}")]
    Malformed(&'static str),
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("a nonce must be between {min} and {max} bytes long; found {found}", min = MIN_NONCE_SIZE, max = MAX_NONCE_SIZE)]
    NonceLength { found: usize },
    #[error("out of range value {value} for {claim} type")]
    OutOfRange { claim: &'static str, value: i64 },
    #[error("duplicate key {0}")]
    DuplicateKey(String),
    #[error("{0}")]
    Invalid(String),
    #[error("couldn't decode CBOR: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),
    #[error("couldn't encode CBOR: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Der(#[from] der::Error),
    #[error("COSE: {0}")]
    Cose(coset::CoseError),
    #[error("{context}")]
    Context {
        context: String,
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn invalid(msg: impl Display) -> Self {
        Self::Invalid(msg.to_string())
    }

    pub(crate) fn unexpected(expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedType { expected, found }
    }

    /// Returns the innermost error, skipping every [`Error::Context`] layer.
    pub fn root_cause(&self) -> &Error {
        let mut err = self;

        while let Error::Context { source, .. } = err {
            err = source;
        }

        err
    }

    /// Iterates from this error down to the root cause, one [`Error::Context`] layer at a time.
    pub fn chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }
}

impl From<coset::CoseError> for Error {
    fn from(value: coset::CoseError) -> Self {
        Self::Cose(value)
    }
}

/// Attach context to an error, keeping the cause as its source.
pub trait WrapErr<T> {
    fn wrap_err<D>(self, context: D) -> Result<T>
    where
        D: Display;

    fn wrap_err_with<D, F>(self, f: F) -> Result<T>
    where
        D: Display,
        F: FnOnce() -> D;
}

impl<T, E> WrapErr<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn wrap_err<D>(self, context: D) -> Result<T>
    where
        D: Display,
    {
        self.map_err(|err| Error::Context {
            context: context.to_string(),
            source: Box::new(err.into()),
        })
    }

    fn wrap_err_with<D, F>(self, f: F) -> Result<T>
    where
        D: Display,
        F: FnOnce() -> D,
    {
        self.map_err(|err| Error::Context {
            context: f().to_string(),
            source: Box::new(err.into()),
        })
    }
}
