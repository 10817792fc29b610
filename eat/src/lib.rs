//! Entity Attestation Token (EAT) claims.
//!
//! Every claim type implements [`Codec`], which encodes to and decodes from both CBOR and JSON.
//! The wire shape of most claims depends on their value (a single nonce or an array of nonces, a
//! URI or an OID, a nested claims-set or a signed token), so decoding always peeks at the encoded
//! item before picking a decoder.
//!
//! ```cddl
//! Claims-Set = {
//!     * $$Claims-Set-Claims
//!     * Claim-Label .feature "extended-claims-label" => any
//! }
//! ```

pub mod claims;
pub mod codec;
pub mod config;
pub mod error;

mod eat;

pub use self::codec::Codec;
pub use self::config::Config;
pub use self::eat::{Eat, claim_key, claim_name};
pub use self::error::{Error, Result, WrapErr};
