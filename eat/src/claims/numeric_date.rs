use std::fmt::Display;

use chrono::{DateTime, SubsecRound, Utc};
use ciborium::Value;

use crate::codec::{Codec, cbor};
use crate::config::{Config, TimeTag};
use crate::error::{Error, Result};

/// Seconds since the Unix epoch, as used by the `exp`, `nbf` and `iat` claims.
///
/// ```cddl
/// NumericDate = #6.1(int)
/// ```
///
/// In JSON the value is a bare integer. Fractional seconds are dropped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericDate(DateTime<Utc>);

impl NumericDate {
    pub fn from_timestamp(secs: i64) -> Result<Self> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| Error::invalid(format!("timestamp {secs} out of range")))
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn date_time(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for NumericDate {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(0))
    }
}

impl Display for NumericDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Codec for NumericDate {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        Ok(Value::Tag(
            cbor::TAG_EPOCH,
            Box::new(Value::Integer(self.timestamp().into())),
        ))
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let secs = if cbor::is_tag(data) {
            let (tag, item) = cbor::untag(data, config)?;

            if tag != cbor::TAG_EPOCH {
                return Err(Error::invalid(format!(
                    "expected epoch time (tag 1), found tag {tag}"
                )));
            }

            cbor::decode_int(item)?
        } else {
            match config.time_tag() {
                TimeTag::Optional => cbor::decode_int(data)?,
                TimeTag::Required => {
                    return Err(Error::unexpected("epoch time (tag 1)", cbor::describe(data)));
                }
            }
        };

        Self::from_timestamp(secs)
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::from(self.timestamp()))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        let secs: i64 = serde_json::from_str(data)?;

        Self::from_timestamp(secs)
    }
}
