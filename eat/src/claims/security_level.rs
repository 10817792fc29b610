use ciborium::Value;

use crate::codec::Codec;
use crate::config::Config;
use crate::error::{Error, Result};

/// ```cddl
/// security-level-type = &(
///     unrestricted: 0,
///     restricted: 1,
///     secure-restricted: 2,
///     hardware: 3
/// )
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SecurityLevel {
    #[default]
    Unrestricted = 0,
    Restricted = 1,
    SecureRestricted = 2,
    Hardware = 3,
}

impl TryFrom<i64> for SecurityLevel {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = match value {
            0 => SecurityLevel::Unrestricted,
            1 => SecurityLevel::Restricted,
            2 => SecurityLevel::SecureRestricted,
            3 => SecurityLevel::Hardware,
            _ => {
                return Err(Error::OutOfRange {
                    claim: "SecurityLevel",
                    value,
                });
            }
        };

        Ok(value)
    }
}

impl From<SecurityLevel> for i64 {
    fn from(value: SecurityLevel) -> Self {
        value as i64
    }
}

impl Codec for SecurityLevel {
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
    fn range() {
        assert_eq!(SecurityLevel::default(), SecurityLevel::Unrestricted);
        assert_eq!(SecurityLevel::try_from(3).unwrap(), SecurityLevel::Hardware);

        let err = SecurityLevel::try_from(1337).unwrap_err();
        assert_eq!(
            err.to_string(),
            "out of range value 1337 for SecurityLevel type"
        );
    }

    #[test]
    fn codec() {
        let config = Config::new();

        assert_eq!(SecurityLevel::Hardware.to_cbor(&config).unwrap(), [0x03]);
        assert_eq!(SecurityLevel::Hardware.to_json(&config).unwrap(), "3");
        assert_eq!(
            SecurityLevel::from_json("2", &config).unwrap(),
            SecurityLevel::SecureRestricted
        );
        assert!(SecurityLevel::from_cbor(&[0x04], &config).is_err());
    }
}
