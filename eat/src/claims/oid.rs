use std::fmt::Display;
use std::str::FromStr;

use der::asn1::AnyRef;
use der::{Decode, Encode, Tag, Tagged};

use crate::error::{Error, Result};

/// An ASN.1 object identifier.
///
/// Arcs are unbounded apart from fitting a `u64`, and so is the number of arcs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(Vec<u64>);

impl Oid {
    /// Checks the first two arcs and builds the identifier.
    pub fn from_arcs(arcs: Vec<u64>) -> Result<Self> {
        match arcs.as_slice() {
            [] | [_] => Err(Error::invalid("OID needs at least 2 arcs")),
            [first, _, ..] if *first > 2 => {
                Err(Error::invalid(format!("invalid first OID arc {first}")))
            }
            [first, second, ..] if *first < 2 && *second >= 40 => Err(Error::invalid(format!(
                "invalid second OID arc {second} under {first}"
            ))),
            [first, second, ..] => {
                (first * 40)
                    .checked_add(*second)
                    .ok_or_else(|| Error::invalid(format!("OID arc {second} is too large")))?;

                Ok(Self(arcs))
            }
        }
    }

    pub fn arcs(&self) -> &[u64] {
        &self.0
    }

    /// Content octets of the DER encoding: the base 128 subidentifiers.
    pub fn to_value_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        // the first two arcs are checked on construction
        if let [first, second, rest @ ..] = self.0.as_slice() {
            push_subidentifier(&mut out, first * 40 + second);

            for arc in rest {
                push_subidentifier(&mut out, *arc);
            }
        }

        out
    }

    pub fn from_value_bytes(value: &[u8]) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::invalid("empty OID"));
        }

        let mut arcs = Vec::new();
        let mut current: u64 = 0;
        let mut started = false;

        for &b in value {
            if !started && b == 0x80 {
                return Err(Error::invalid("non-minimal OID subidentifier"));
            }

            if current >> 57 != 0 {
                return Err(Error::invalid("OID subidentifier overflows u64"));
            }

            current = (current << 7) | u64::from(b & 0x7f);
            started = true;

            if b & 0x80 == 0 {
                if arcs.is_empty() {
                    let (first, second) = match current {
                        0..40 => (0, current),
                        40..80 => (1, current - 40),
                        _ => (2, current - 80),
                    };

                    arcs.extend([first, second]);
                } else {
                    arcs.push(current);
                }

                current = 0;
                started = false;
            }
        }

        if started {
            return Err(Error::invalid("truncated OID subidentifier"));
        }

        Ok(Self(arcs))
    }

    /// Full DER encoding, tag and length included.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let value = self.to_value_bytes();

        Ok(AnyRef::new(Tag::ObjectIdentifier, &value)?.to_der()?)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let any = AnyRef::from_der(der)?;

        if any.tag() != Tag::ObjectIdentifier {
            return Err(Error::invalid(format!("expected OID, found {}", any.tag())));
        }

        Self::from_value_bytes(any.value())
    }
}

fn push_subidentifier(out: &mut Vec<u8>, value: u64) {
    let groups = (u64::BITS - value.leading_zeros()).div_ceil(7).max(1);

    for i in (0..groups).rev() {
        let byte = ((value >> (7 * i)) & 0x7f) as u8;

        if i == 0 {
            out.push(byte);
        } else {
            out.push(byte | 0x80);
        }
    }
}

/// Splits a dotted-decimal string into its arcs, without checking the first two.
pub(crate) fn parse_arcs(input: &str) -> Result<Vec<u64>> {
    input
        .split('.')
        .map(|arc| {
            if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::invalid(format!("invalid OID arc {arc:?}")));
            }

            arc.parse::<u64>()
                .map_err(|err| Error::invalid(format!("invalid OID arc {arc:?}: {err}")))
        })
        .collect()
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_arcs(s).and_then(Self::from_arcs)
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut arcs = self.0.iter();

        if let Some(first) = arcs.next() {
            write!(f, "{first}")?;
        }

        for arc in arcs {
            write!(f, ".{arc}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encodings() {
        let oid: Oid = "1.2.840.113549".parse().unwrap();
        assert_eq!(oid.to_value_bytes(), [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d]);

        let oid: Oid = "2.999.3".parse().unwrap();
        assert_eq!(oid.to_value_bytes(), [0x88, 0x37, 0x03]);
        assert_eq!(Oid::from_value_bytes(&[0x88, 0x37, 0x03]).unwrap(), oid);

        let oid: Oid = "0.0".parse().unwrap();
        assert_eq!(oid.to_value_bytes(), [0x00]);
        assert_eq!(oid.to_string(), "0.0");
    }

    #[test]
    fn large_arcs() {
        let oid: Oid = "1.3.18446744073709551615".parse().unwrap();
        let value = oid.to_value_bytes();

        assert_eq!(value.len(), 11);
        assert_eq!(Oid::from_value_bytes(&value).unwrap(), oid);

        assert!("1.3.18446744073709551616".parse::<Oid>().is_err());
    }

    #[test]
    fn invalid_arcs() {
        assert!("3.1".parse::<Oid>().is_err());
        assert!("1.40".parse::<Oid>().is_err());
        assert!("1".parse::<Oid>().is_err());
        assert!("1.2.".parse::<Oid>().is_err());
        assert!("1.+2".parse::<Oid>().is_err());
    }

    #[test]
    fn invalid_value_bytes() {
        assert!(Oid::from_value_bytes(&[]).is_err());
        // leading 0x80 padding
        assert!(Oid::from_value_bytes(&[0x2a, 0x80, 0x01]).is_err());
        // last byte has the continuation bit
        assert!(Oid::from_value_bytes(&[0x2a, 0x86]).is_err());

        let mut overflow = vec![0x2a];
        overflow.extend([0xff; 10]);
        overflow.push(0x7f);
        assert!(Oid::from_value_bytes(&overflow).is_err());
    }

    #[test]
    fn der_framing() {
        let oid: Oid = "1.2.840.113549".parse().unwrap();

        let der = oid.to_der().unwrap();
        assert_eq!(der, [0x06, 0x06, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d]);
        assert_eq!(Oid::from_der(&der).unwrap(), oid);

        // OCTET STRING
        assert!(Oid::from_der(&[0x04, 0x01, 0x2a]).is_err());
    }
}
