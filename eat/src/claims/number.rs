use std::fmt::Display;

use ciborium::Value;
use half::f16;

use crate::codec::{Codec, cbor};
use crate::config::Config;
use crate::error::{Error, Result};

/// Wire width chosen for a [`ClaimNumber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberWidth {
    Integer,
    Half,
    Single,
    Double,
}

/// A number encoded in the smallest lossless form.
///
/// Integral values are encoded as integers, everything else as the first of float16, float32 and
/// float64 that holds the value exactly.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ClaimNumber(f64);

impl ClaimNumber {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub const fn get(&self) -> f64 {
        self.0
    }

    fn as_integer(&self) -> Option<i64> {
        let value = self.0;

        // -2^63 and 2^63 are exact in f64, the range is half-open.
        let in_range = (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&value);

        if value.fract() == 0.0 && in_range {
            Some(value as i64)
        } else {
            None
        }
    }

    pub fn width(&self) -> NumberWidth {
        let value = self.0;

        if self.as_integer().is_some() {
            NumberWidth::Integer
        } else if f16::from_f64(value).to_f64() == value {
            NumberWidth::Half
        } else if f64::from(value as f32) == value {
            NumberWidth::Single
        } else {
            NumberWidth::Double
        }
    }
}

impl From<f64> for ClaimNumber {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i32> for ClaimNumber {
    fn from(value: i32) -> Self {
        Self(value.into())
    }
}

impl Display for ClaimNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Codec for ClaimNumber {
    fn to_cbor_value(&self, _config: &Config) -> Result<Value> {
        // ciborium picks the narrowest float that round-trips
        match self.as_integer() {
            Some(int) => Ok(Value::Integer(int.into())),
            None => Ok(Value::Float(self.0)),
        }
    }

    fn from_cbor_item(data: &[u8], _config: &Config) -> Result<Self> {
        match data.first() {
            Some(0x00..=0x3b) => {
                let int: i128 = cbor::decode(data)?;

                Ok(Self(int as f64))
            }
            Some(0xf9..=0xfb) => cbor::decode::<f64>(data).map(Self),
            _ => Err(Error::unexpected("number", cbor::describe(data))),
        }
    }

    fn to_json_value(&self, _config: &Config) -> Result<serde_json::Value> {
        if let Some(int) = self.as_integer() {
            return Ok(serde_json::Value::from(int));
        }

        serde_json::Number::from_f64(self.0)
            .map(serde_json::Value::Number)
            .ok_or_else(|| Error::invalid(format!("{} can't be represented in JSON", self.0)))
    }

    fn from_json_str(data: &str, _config: &Config) -> Result<Self> {
        serde_json::from_str::<f64>(data)
            .map(Self)
            .map_err(Error::from)
    }
}
