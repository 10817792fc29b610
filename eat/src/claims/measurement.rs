use ciborium::Value;
use serde_bytes::ByteBuf;

use crate::codec::{Codec, cbor, json};
use crate::config::Config;
use crate::error::{Error, Result, WrapErr};

/// An entry of the `measurements` claim.
///
/// ```cddl
/// measurements-format = [
///     content-type:   coap-content-format,
///     content-format: bstr
/// ]
/// ```
///
/// The format is usually a CBOR encoded measurement (an untagged CoSWID or a
/// [`MeasuredComponent`](super::MeasuredComponent)), see [`Measurement::decode_format`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Measurement {
    content_type: i64,
    format: ByteBuf,
}

impl Measurement {
    pub fn new(content_type: i64, format: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type,
            format: ByteBuf::from(format.into()),
        }
    }

    /// Wraps the CBOR encoding of `value`.
    pub fn encode_format<T>(content_type: i64, value: &T, config: &Config) -> Result<Self>
    where
        T: Codec,
    {
        let format = value.to_cbor(config)?;

        Ok(Self::new(content_type, format))
    }

    pub fn content_type(&self) -> i64 {
        self.content_type
    }

    pub fn format(&self) -> &[u8] {
        &self.format
    }

    /// Decodes the format bytes as a CBOR item.
    pub fn decode_format<T>(&self, config: &Config) -> Result<T>
    where
        T: Codec,
    {
        T::from_cbor(&self.format, config).wrap_err("couldn't decode measurement format")
    }
}

fn check_len(len: usize) -> Result<()> {
    if len != 2 {
        return Err(Error::invalid(format!(
            "a measurement must have 2 elements, found {len}"
        )));
    }

    Ok(())
}

impl Codec for Measurement {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        Ok(Value::Array(vec![
            self.content_type.to_cbor_value(config)?,
            self.format.to_cbor_value(config)?,
        ]))
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let items = cbor::split_array(data, config)?;

        check_len(items.len())?;

        Ok(Self {
            content_type: i64::from_cbor_item(items[0], config)
                .wrap_err("invalid measurement content type")?,
            format: ByteBuf::from_cbor_item(items[1], config)
                .wrap_err("invalid measurement format")?,
        })
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Array(vec![
            self.content_type.to_json_value(config)?,
            self.format.to_json_value(config)?,
        ]))
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let items = json::split_array(data)?;

        check_len(items.len())?;

        Ok(Self {
            content_type: i64::from_json_str(items[0].get(), config)
                .wrap_err("invalid measurement content type")?,
            format: ByteBuf::from_json_str(items[1].get(), config)
                .wrap_err("invalid measurement format")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const FORMAT: [u8; 26] = [
        0xa4, 0x00, 0x63, 0x66, 0x6f, 0x6f, 0x0c, 0x01, 0x01, 0x63, 0x62, 0x61,
        0x72, 0x02, 0xa2, 0x18, 0x1f, 0x63, 0x62, 0x61, 0x7a, 0x18, 0x21, 0x82,
        0x01, 0x02,
    ];

    // [258, << {0: "foo", 12: 1, 1: "bar", 2: {31: "baz", 33: [1, 2]}} >>]
    #[rustfmt::skip]
    const ENCODED: [u8; 32] = [
        0x82, 0x19, 0x01, 0x02, 0x58, 0x1a, 0xa4, 0x00, 0x63, 0x66, 0x6f, 0x6f,
        0x0c, 0x01, 0x01, 0x63, 0x62, 0x61, 0x72, 0x02, 0xa2, 0x18, 0x1f, 0x63,
        0x62, 0x61, 0x7a, 0x18, 0x21, 0x82, 0x01, 0x02,
    ];

    #[test]
    fn cbor_encoding() {
        let config = Config::new();
        let measurement = Measurement::new(258, FORMAT);

        assert_eq!(measurement.to_cbor(&config).unwrap(), ENCODED);

        let decoded = Measurement::from_cbor(&ENCODED, &config).unwrap();
        assert_eq!(decoded.content_type(), 258);
        assert_eq!(decoded.format(), FORMAT);
    }

    #[test]
    fn json_encoding() {
        let config = Config::new();
        let measurement = Measurement::new(258, [0xde, 0xad, 0xbe, 0xef]);

        let json = measurement.to_json(&config).unwrap();
        assert_eq!(json, r#"[258,"3q2+7w=="]"#);
        assert_eq!(Measurement::from_json(&json, &config).unwrap(), measurement);
    }

    #[test]
    fn wrong_shape() {
        let config = Config::new();

        // [258]
        assert!(Measurement::from_cbor(&[0x81, 0x19, 0x01, 0x02], &config).is_err());
        // [h'', 1]
        assert!(Measurement::from_cbor(&[0x82, 0x40, 0x01], &config).is_err());
    }
}
