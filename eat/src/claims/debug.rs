use ciborium::Value;

use crate::codec::Codec;
use crate::config::Config;
use crate::error::{Error, Result};

/// The `debug-disable` claim.
///
/// ```cddl
/// debug-disable-type = &(
///     not-disabled: 0,
///     disabled: 1,
///     disabled-since-boot: 2,
///     permanent-disable: 3,
///     full-permanent-disable: 4
/// )
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DebugStatus {
    #[default]
    NotDisabled = 0,
    Disabled = 1,
    DisabledSinceBoot = 2,
    PermanentDisable = 3,
    FullPermanentDisable = 4,
}

impl TryFrom<i64> for DebugStatus {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = match value {
            0 => DebugStatus::NotDisabled,
            1 => DebugStatus::Disabled,
            2 => DebugStatus::DisabledSinceBoot,
            3 => DebugStatus::PermanentDisable,
            4 => DebugStatus::FullPermanentDisable,
            _ => {
                return Err(Error::OutOfRange {
                    claim: "Debug",
                    value,
                });
            }
        };

        Ok(value)
    }
}

impl From<DebugStatus> for i64 {
    fn from(value: DebugStatus) -> Self {
        value as i64
    }
}

impl Codec for DebugStatus {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        i64::from(*self).to_cbor_value(config)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        i64::from_cbor_item(data, config).and_then(Self::try_from)
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        i64::from(*self).to_json_value(config)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        i64::from_json_str(data, config).and_then(Self::try_from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_values() {
        for value in 0..=4 {
            let status = DebugStatus::try_from(value).unwrap();

            assert_eq!(i64::from(status), value);
        }
    }

    #[test]
    fn out_of_range() {
        let err = DebugStatus::try_from(5).unwrap_err();
        assert_eq!(err.to_string(), "out of range value 5 for Debug type");

        let err = DebugStatus::from_cbor(&[0x05], &Config::new()).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { claim: "Debug", value: 5 }));
    }

    #[test]
    fn codec() {
        let config = Config::new();

        assert_eq!(DebugStatus::Disabled.to_cbor(&config).unwrap(), [0x01]);
        assert_eq!(
            DebugStatus::from_json("4", &config).unwrap(),
            DebugStatus::FullPermanentDisable
        );
    }
}
