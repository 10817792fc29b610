//! Types of the values carried by the claims of an [`Eat`](crate::Eat).

mod audience;
mod debug;
mod location;
mod measured_component;
mod measurement;
pub mod nonce;
mod number;
mod numeric_date;
mod oid;
pub mod profile;
mod security_level;
mod string_or_uri;
pub mod submods;
mod ueid;
mod version;

pub use self::audience::Audience;
pub use self::debug::DebugStatus;
pub use self::location::Location;
pub use self::measured_component::{ComponentId, HashEntry, MeasuredComponent};
pub use self::measurement::Measurement;
pub use self::nonce::{Nonce, Nonces};
pub use self::number::{ClaimNumber, NumberWidth};
pub use self::numeric_date::NumericDate;
pub use self::oid::Oid;
pub use self::profile::Profile;
pub use self::security_level::SecurityLevel;
pub use self::string_or_uri::{StringOrUri, Uri};
pub use self::submods::{SignedToken, Submod, SubmodName, Submods};
pub use self::ueid::{Ueid, UeidType};
pub use self::version::{Version, VersionScheme};
