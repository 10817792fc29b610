use ciborium::Value;

use super::{ClaimNumber, NumericDate};
use crate::codec::Codec;
use crate::codec::map::{CborMap, CborMapBuilder, Field, JsonMap, JsonMapBuilder};
use crate::config::Config;
use crate::error::Result;

const LATITUDE: Field = Field::new(1, "lat");
const LONGITUDE: Field = Field::new(2, "long");
const ALTITUDE: Field = Field::new(3, "alt");
const ACCURACY: Field = Field::new(4, "accry");
const ALTITUDE_ACCURACY: Field = Field::new(5, "alt-accry");
const HEADING: Field = Field::new(6, "heading");
const SPEED: Field = Field::new(7, "speed");
const TIMESTAMP: Field = Field::new(8, "timestamp");
const AGE: Field = Field::new(9, "age");

const FIELDS: [Field; 9] = [
    LATITUDE,
    LONGITUDE,
    ALTITUDE,
    ACCURACY,
    ALTITUDE_ACCURACY,
    HEADING,
    SPEED,
    TIMESTAMP,
    AGE,
];

/// The `location` claim.
///
/// ```cddl
/// location-type = {
///     latitude => number,
///     longitude => number,
///     ? altitude => number,
///     ? accuracy => number,
///     ? altitude-accuracy => number,
///     ? heading => number,
///     ? speed => number,
///     ? timestamp => time-int,
///     ? age => uint
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub latitude: ClaimNumber,
    pub longitude: ClaimNumber,
    pub altitude: Option<ClaimNumber>,
    pub accuracy: Option<ClaimNumber>,
    pub altitude_accuracy: Option<ClaimNumber>,
    pub heading: Option<ClaimNumber>,
    pub speed: Option<ClaimNumber>,
    pub timestamp: Option<NumericDate>,
    pub age: Option<u64>,
}

impl Location {
    pub fn new(latitude: impl Into<ClaimNumber>, longitude: impl Into<ClaimNumber>) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            ..Default::default()
        }
    }
}

impl Codec for Location {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        let value = CborMapBuilder::new(config)
            .field(LATITUDE, Some(&self.latitude))?
            .field(LONGITUDE, Some(&self.longitude))?
            .field(ALTITUDE, self.altitude.as_ref())?
            .field(ACCURACY, self.accuracy.as_ref())?
            .field(ALTITUDE_ACCURACY, self.altitude_accuracy.as_ref())?
            .field(HEADING, self.heading.as_ref())?
            .field(SPEED, self.speed.as_ref())?
            .field(TIMESTAMP, self.timestamp.as_ref())?
            .field(AGE, self.age.as_ref())?
            .build();

        Ok(value)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let map = CborMap::parse(data, &FIELDS, config)?;

        Ok(Self {
            latitude: map.required(LATITUDE)?,
            longitude: map.required(LONGITUDE)?,
            altitude: map.optional(ALTITUDE)?,
            accuracy: map.optional(ACCURACY)?,
            altitude_accuracy: map.optional(ALTITUDE_ACCURACY)?,
            heading: map.optional(HEADING)?,
            speed: map.optional(SPEED)?,
            timestamp: map.optional(TIMESTAMP)?,
            age: map.optional(AGE)?,
        })
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        let value = JsonMapBuilder::new(config)
            .field(LATITUDE, Some(&self.latitude))?
            .field(LONGITUDE, Some(&self.longitude))?
            .field(ALTITUDE, self.altitude.as_ref())?
            .field(ACCURACY, self.accuracy.as_ref())?
            .field(ALTITUDE_ACCURACY, self.altitude_accuracy.as_ref())?
            .field(HEADING, self.heading.as_ref())?
            .field(SPEED, self.speed.as_ref())?
            .field(TIMESTAMP, self.timestamp.as_ref())?
            .field(AGE, self.age.as_ref())?
            .build();

        Ok(value)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let map = JsonMap::parse(data, &FIELDS, config)?;

        Ok(Self {
            latitude: map.required(LATITUDE)?,
            longitude: map.required(LONGITUDE)?,
            altitude: map.optional(ALTITUDE)?,
            accuracy: map.optional(ACCURACY)?,
            altitude_accuracy: map.optional(ALTITUDE_ACCURACY)?,
            heading: map.optional(HEADING)?,
            speed: map.optional(SPEED)?,
            timestamp: map.optional(TIMESTAMP)?,
            age: map.optional(AGE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Location {
        Location {
            latitude: 12.34.into(),
            longitude: 56.78.into(),
            altitude: Some(1.9306640625.into()),
            accuracy: Some(3.1414999961853027.into()),
            altitude_accuracy: Some(3.into()),
            heading: Some((-12).into()),
            speed: Some(0.5.into()),
            timestamp: Some(NumericDate::from_timestamp(1604966400).unwrap()),
            age: Some(969),
        }
    }

    #[test]
    fn minimal_cbor() {
        let config = Config::new();
        let location = Location::new(3, -12);

        assert_eq!(
            location.to_cbor(&config).unwrap(),
            [0xa2, 0x01, 0x03, 0x02, 0x2b]
        );
        assert_eq!(
            Location::from_cbor(&[0xa2, 0x01, 0x03, 0x02, 0x2b], &config).unwrap(),
            location
        );
    }

    #[test]
    fn full_cbor() {
        let config = Config::new();
        let location = full();

        let data = location.to_cbor(&config).unwrap();

        #[rustfmt::skip]
        let expected = [
            0xa9,
            0x01, 0xfb, 0x40, 0x28, 0xae, 0x14, 0x7a, 0xe1, 0x47, 0xae,
            0x02, 0xfb, 0x40, 0x4c, 0x63, 0xd7, 0x0a, 0x3d, 0x70, 0xa4,
            0x03, 0xf9, 0x3f, 0xb9,
            0x04, 0xfa, 0x40, 0x49, 0x0e, 0x56,
            0x05, 0x03,
            0x06, 0x2b,
            0x07, 0xf9, 0x38, 0x00,
            0x08, 0xc1, 0x1a, 0x5f, 0xa9, 0xd8, 0x00,
            0x09, 0x19, 0x03, 0xc9,
        ];

        assert_eq!(data, expected);
        assert_eq!(Location::from_cbor(&data, &config).unwrap(), location);
    }

    #[test]
    fn json() {
        let config = Config::new();

        let json = Location::new(12.34, 56.78).to_json(&config).unwrap();
        assert_eq!(json, r#"{"lat":12.34,"long":56.78}"#);

        let location = full();
        let json = location.to_json(&config).unwrap();
        assert_eq!(Location::from_json(&json, &config).unwrap(), location);
    }

    #[test]
    fn latitude_and_longitude_are_required() {
        let config = Config::new();

        let err = Location::from_json(r#"{"lat": 1}"#, &config).unwrap_err();
        assert_eq!(err.to_string(), "missing required field long");

        assert!(Location::from_cbor(&[0xa1, 0x02, 0x01], &config).is_err());
    }
}
