use ciborium::Value;
use serde_bytes::ByteBuf;
use tracing::debug;

use crate::claims::{
    Audience, DebugStatus, Location, Measurement, Nonces, NumericDate, Profile, SecurityLevel,
    StringOrUri, Submod, Submods, Ueid, Version,
};
use crate::codec::Codec;
use crate::codec::map::{CborMap, CborMapBuilder, Field, JsonMap, JsonMapBuilder};
use crate::config::Config;
use crate::error::{Result, WrapErr};

const ISSUER: Field = Field::new(1, "iss");
const SUBJECT: Field = Field::new(2, "sub");
const AUDIENCE: Field = Field::new(3, "aud");
const EXPIRATION: Field = Field::new(4, "exp");
const NOT_BEFORE: Field = Field::new(5, "nbf");
const ISSUED_AT: Field = Field::new(6, "iat");
const CWT_ID: Field = Field::new(7, "cti");
const NONCE: Field = Field::new(10, "nonce");
const UEID: Field = Field::new(11, "ueid");
const ORIGINATION: Field = Field::new(12, "origination");
const OEMID: Field = Field::new(13, "oemid");
const SECURITY_LEVEL: Field = Field::new(14, "security-level");
const SECURE_BOOT: Field = Field::new(15, "secure-boot");
const DEBUG_DISABLE: Field = Field::new(16, "debug-disable");
const LOCATION: Field = Field::new(17, "location");
const PROFILE: Field = Field::new(18, "eat-profile");
const UPTIME: Field = Field::new(19, "uptime");
const SUBMODS: Field = Field::new(20, "submods");
const HW_VERSION: Field = Field::new(260, "hw-version");
const SW_NAME: Field = Field::new(270, "sw-name");
const SW_VERSION: Field = Field::new(271, "sw-version");
const MEASUREMENTS: Field = Field::new(273, "measurements");

const FIELDS: [Field; 22] = [
    ISSUER,
    SUBJECT,
    AUDIENCE,
    EXPIRATION,
    NOT_BEFORE,
    ISSUED_AT,
    CWT_ID,
    NONCE,
    UEID,
    ORIGINATION,
    OEMID,
    SECURITY_LEVEL,
    SECURE_BOOT,
    DEBUG_DISABLE,
    LOCATION,
    PROFILE,
    UPTIME,
    SUBMODS,
    HW_VERSION,
    SW_NAME,
    SW_VERSION,
    MEASUREMENTS,
];

/// Returns the CBOR key of a claim from its JSON name.
pub fn claim_key(name: &str) -> Option<i64> {
    FIELDS
        .iter()
        .find(|field| field.name == name)
        .map(|field| field.key)
}

/// Returns the JSON name of a claim from its CBOR key.
pub fn claim_name(key: i64) -> Option<&'static str> {
    FIELDS
        .iter()
        .find(|field| field.key == key)
        .map(|field| field.name)
}

/// An Entity Attestation Token claims-set.
///
/// Every claim is optional and they are not checked against each other. Encoding writes the
/// present claims in ascending key order, decoding skips the claims it doesn't know.
///
/// ```cddl
/// eat-claims = {
///     ? iss => tstr,
///     ? sub => tstr,
///     ? aud => tstr / [* tstr],
///     ? exp => ~time,
///     ? nbf => ~time,
///     ? iat => ~time,
///     ? cti => bstr,
///     ? nonce => nonce-type / [ 2* nonce-type ],
///     ? ueid => ueid-type,
///     ? origination => string-or-uri,
///     ? oemid => bstr,
///     ? security-level => security-level-type,
///     ? secure-boot => bool,
///     ? debug-disable => debug-disable-type,
///     ? location => location-type,
///     ? eat-profile => general-uri / general-oid,
///     ? uptime => uint,
///     ? submods => { + submod-name => eat-claims / eat-token },
///     ? hw-version => version-type,
///     ? sw-name => tstr,
///     ? sw-version => version-type,
///     ? measurements => [+ measurements-format],
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eat {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub audience: Option<Audience>,
    pub expiration: Option<NumericDate>,
    pub not_before: Option<NumericDate>,
    pub issued_at: Option<NumericDate>,
    pub cwt_id: Option<ByteBuf>,
    pub nonce: Option<Nonces>,
    pub ueid: Option<Ueid>,
    pub origination: Option<StringOrUri>,
    pub oemid: Option<ByteBuf>,
    pub security_level: Option<SecurityLevel>,
    pub secure_boot: Option<bool>,
    pub debug_disable: Option<DebugStatus>,
    pub location: Option<Location>,
    pub profile: Option<Profile>,
    pub uptime: Option<u64>,
    pub submods: Option<Submods>,
    pub hw_version: Option<Version>,
    pub sw_name: Option<String>,
    pub sw_version: Option<Version>,
    pub measurements: Option<Vec<Measurement>>,
}

impl Eat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the claims that have constraints the codec doesn't enforce on decode, recursing
    /// into the nested claims-sets.
    pub fn validate(&self) -> Result<()> {
        if let Some(nonce) = &self.nonce {
            nonce.validate().wrap_err("invalid nonce claim")?;
        }

        if let Some(ueid) = &self.ueid {
            ueid.validate().wrap_err("invalid ueid claim")?;
        }

        if let Some(submods) = &self.submods {
            for (name, submod) in submods.iter() {
                if let Submod::Claims(claims) = submod {
                    claims
                        .validate()
                        .wrap_err_with(|| format!("invalid submod {name}"))?;
                }
            }
        }

        Ok(())
    }

    /// Names of the claims that are set, in key order.
    pub fn present_claims(&self) -> Vec<&'static str> {
        let present = [
            self.issuer.is_some(),
            self.subject.is_some(),
            self.audience.is_some(),
            self.expiration.is_some(),
            self.not_before.is_some(),
            self.issued_at.is_some(),
            self.cwt_id.is_some(),
            self.nonce.is_some(),
            self.ueid.is_some(),
            self.origination.is_some(),
            self.oemid.is_some(),
            self.security_level.is_some(),
            self.secure_boot.is_some(),
            self.debug_disable.is_some(),
            self.location.is_some(),
            self.profile.is_some(),
            self.uptime.is_some(),
            self.submods.is_some(),
            self.hw_version.is_some(),
            self.sw_name.is_some(),
            self.sw_version.is_some(),
            self.measurements.is_some(),
        ];

        FIELDS
            .iter()
            .zip(present)
            .filter_map(|(field, present)| present.then_some(field.name))
            .collect()
    }
}

impl Codec for Eat {
    fn to_cbor_value(&self, config: &Config) -> Result<Value> {
        let value = CborMapBuilder::new(config)
            .field(ISSUER, self.issuer.as_ref())?
            .field(SUBJECT, self.subject.as_ref())?
            .field(AUDIENCE, self.audience.as_ref())?
            .field(EXPIRATION, self.expiration.as_ref())?
            .field(NOT_BEFORE, self.not_before.as_ref())?
            .field(ISSUED_AT, self.issued_at.as_ref())?
            .field(CWT_ID, self.cwt_id.as_ref())?
            .field(NONCE, self.nonce.as_ref())?
            .field(UEID, self.ueid.as_ref())?
            .field(ORIGINATION, self.origination.as_ref())?
            .field(OEMID, self.oemid.as_ref())?
            .field(SECURITY_LEVEL, self.security_level.as_ref())?
            .field(SECURE_BOOT, self.secure_boot.as_ref())?
            .field(DEBUG_DISABLE, self.debug_disable.as_ref())?
            .field(LOCATION, self.location.as_ref())?
            .field(PROFILE, self.profile.as_ref())?
            .field(UPTIME, self.uptime.as_ref())?
            .field(SUBMODS, self.submods.as_ref())?
            .field(HW_VERSION, self.hw_version.as_ref())?
            .field(SW_NAME, self.sw_name.as_ref())?
            .field(SW_VERSION, self.sw_version.as_ref())?
            .field(MEASUREMENTS, self.measurements.as_ref())?
            .build();

        Ok(value)
    }

    fn from_cbor_item(data: &[u8], config: &Config) -> Result<Self> {
        let map = CborMap::parse(data, &FIELDS, config)?;

        let eat = Self {
            issuer: map.optional(ISSUER)?,
            subject: map.optional(SUBJECT)?,
            audience: map.optional(AUDIENCE)?,
            expiration: map.optional(EXPIRATION)?,
            not_before: map.optional(NOT_BEFORE)?,
            issued_at: map.optional(ISSUED_AT)?,
            cwt_id: map.optional(CWT_ID)?,
            nonce: map.optional(NONCE)?,
            ueid: map.optional(UEID)?,
            origination: map.optional(ORIGINATION)?,
            oemid: map.optional(OEMID)?,
            security_level: map.optional(SECURITY_LEVEL)?,
            secure_boot: map.optional(SECURE_BOOT)?,
            debug_disable: map.optional(DEBUG_DISABLE)?,
            location: map.optional(LOCATION)?,
            profile: map.optional(PROFILE)?,
            uptime: map.optional(UPTIME)?,
            submods: map.optional(SUBMODS)?,
            hw_version: map.optional(HW_VERSION)?,
            sw_name: map.optional(SW_NAME)?,
            sw_version: map.optional(SW_VERSION)?,
            measurements: map.optional(MEASUREMENTS)?,
        };

        debug!(claims = ?eat.present_claims(), "decoded CBOR claims-set");

        Ok(eat)
    }

    fn to_json_value(&self, config: &Config) -> Result<serde_json::Value> {
        let value = JsonMapBuilder::new(config)
            .field(ISSUER, self.issuer.as_ref())?
            .field(SUBJECT, self.subject.as_ref())?
            .field(AUDIENCE, self.audience.as_ref())?
            .field(EXPIRATION, self.expiration.as_ref())?
            .field(NOT_BEFORE, self.not_before.as_ref())?
            .field(ISSUED_AT, self.issued_at.as_ref())?
            .field(CWT_ID, self.cwt_id.as_ref())?
            .field(NONCE, self.nonce.as_ref())?
            .field(UEID, self.ueid.as_ref())?
            .field(ORIGINATION, self.origination.as_ref())?
            .field(OEMID, self.oemid.as_ref())?
            .field(SECURITY_LEVEL, self.security_level.as_ref())?
            .field(SECURE_BOOT, self.secure_boot.as_ref())?
            .field(DEBUG_DISABLE, self.debug_disable.as_ref())?
            .field(LOCATION, self.location.as_ref())?
            .field(PROFILE, self.profile.as_ref())?
            .field(UPTIME, self.uptime.as_ref())?
            .field(SUBMODS, self.submods.as_ref())?
            .field(HW_VERSION, self.hw_version.as_ref())?
            .field(SW_NAME, self.sw_name.as_ref())?
            .field(SW_VERSION, self.sw_version.as_ref())?
            .field(MEASUREMENTS, self.measurements.as_ref())?
            .build();

        Ok(value)
    }

    fn from_json_str(data: &str, config: &Config) -> Result<Self> {
        let map = JsonMap::parse(data, &FIELDS, config)?;

        let eat = Self {
            issuer: map.optional(ISSUER)?,
            subject: map.optional(SUBJECT)?,
            audience: map.optional(AUDIENCE)?,
            expiration: map.optional(EXPIRATION)?,
            not_before: map.optional(NOT_BEFORE)?,
            issued_at: map.optional(ISSUED_AT)?,
            cwt_id: map.optional(CWT_ID)?,
            nonce: map.optional(NONCE)?,
            ueid: map.optional(UEID)?,
            origination: map.optional(ORIGINATION)?,
            oemid: map.optional(OEMID)?,
            security_level: map.optional(SECURITY_LEVEL)?,
            secure_boot: map.optional(SECURE_BOOT)?,
            debug_disable: map.optional(DEBUG_DISABLE)?,
            location: map.optional(LOCATION)?,
            profile: map.optional(PROFILE)?,
            uptime: map.optional(UPTIME)?,
            submods: map.optional(SUBMODS)?,
            hw_version: map.optional(HW_VERSION)?,
            sw_name: map.optional(SW_NAME)?,
            sw_version: map.optional(SW_VERSION)?,
            measurements: map.optional(MEASUREMENTS)?,
        };

        debug!(claims = ?eat.present_claims(), "decoded JSON claims-set");

        Ok(eat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn claim_table() {
        assert_eq!(claim_key("eat-profile"), Some(18));
        assert_eq!(claim_key("measurements"), Some(273));
        assert_eq!(claim_key("cnf"), None);

        assert_eq!(claim_name(10), Some("nonce"));
        assert_eq!(claim_name(271), Some("sw-version"));
        assert_eq!(claim_name(8), None);

        for field in FIELDS {
            assert_eq!(claim_key(field.name), Some(field.key));
        }

        assert!(FIELDS.windows(2).all(|pair| pair[0].key < pair[1].key));
    }

    #[test]
    fn expiration_only() {
        let config = Config::new();
        let eat = Eat {
            expiration: Some(NumericDate::from_timestamp(0).unwrap()),
            ..Default::default()
        };

        let data = eat.to_cbor(&config).unwrap();
        assert_eq!(data, [0xa1, 0x04, 0xc1, 0x00]);
        assert_eq!(Eat::from_cbor(&data, &config).unwrap(), eat);

        let json = eat.to_json(&config).unwrap();
        assert_eq!(json, r#"{"exp":0}"#);
        assert_eq!(Eat::from_json(&json, &config).unwrap(), eat);

        assert_eq!(eat.present_claims(), ["exp"]);
    }

    #[test]
    fn keys_are_sorted() {
        let config = Config::new();
        let eat = Eat {
            sw_name: Some("fw".to_string()),
            issuer: Some("me".to_string()),
            secure_boot: Some(true),
            ..Default::default()
        };

        assert_eq!(
            eat.to_cbor(&config).unwrap(),
            [
                0xa3, 0x01, 0x62, b'm', b'e', 0x0f, 0xf5, 0x19, 0x01, 0x0e, 0x62, b'f', b'w'
            ]
        );
    }

    #[test]
    fn skips_unknown_claims() {
        let config = Config::new();

        // {8: {1: h'00'}, 15: false, "x": 1}
        let data = [
            0xa3, 0x08, 0xa1, 0x01, 0x41, 0x00, 0x0f, 0xf4, 0x61, b'x', 0x01,
        ];
        let eat = Eat::from_cbor(&data, &config).unwrap();
        assert_eq!(eat.secure_boot, Some(false));
        assert_eq!(eat.present_claims(), ["secure-boot"]);

        let eat = Eat::from_json(r#"{"cnf": {}, "uptime": 30}"#, &config).unwrap();
        assert_eq!(eat.uptime, Some(30));
    }

    #[test]
    fn rejects_duplicates_and_non_maps() {
        let config = Config::new();

        assert!(matches!(
            Eat::from_cbor(&[0xa2, 0x13, 0x01, 0x13, 0x02], &config),
            Err(Error::DuplicateKey(key)) if key == "19"
        ));
        assert!(matches!(
            Eat::from_json(r#"{"uptime": 1, "uptime": 2}"#, &config),
            Err(Error::DuplicateKey(key)) if key == "uptime"
        ));

        assert!(Eat::from_cbor(&[0x80], &config).is_err());
        assert!(Eat::from_json("[]", &config).is_err());
    }

    #[test]
    fn decode_error_names_the_claim() {
        let config = Config::new();

        // {14: 7}
        let err = Eat::from_cbor(&[0xa1, 0x0e, 0x07], &config).unwrap_err();
        assert_eq!(err.to_string(), "couldn't decode security-level");
        assert_eq!(
            err.root_cause().to_string(),
            "out of range value 7 for SecurityLevel type"
        );
    }

    #[test]
    fn validate_recurses_into_submods() {
        let config = Config::new();

        // {20: {"a": {10: h'deadbeef'}}}
        let data = [
            0xa1, 0x14, 0xa1, 0x61, b'a', 0xa1, 0x0a, 0x44, 0xde, 0xad, 0xbe, 0xef,
        ];
        let eat = Eat::from_cbor(&data, &config).unwrap();

        let err = eat.validate().unwrap_err();
        assert_eq!(
            err.chain().take(2).map(ToString::to_string).collect::<Vec<_>>(),
            ["invalid submod a", "invalid nonce claim"]
        );
        assert!(matches!(err.root_cause(), Error::NonceLength { found: 4 }));

        assert!(Eat::new().validate().is_ok());
    }
}
