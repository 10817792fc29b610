//! Codec configuration.
//!
//! A [`Config`] is passed explicitly to every encode and decode call. It is immutable once built
//! and cheap to copy.

/// How a plain string is classified when decoding a [`StringOrUri`](crate::claims::StringOrUri).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UriDetection {
    /// A string containing a `:` that parses as an absolute URI becomes a URI, as RFC 7519 reads
    /// `StringOrURI`. A text value such as `"urn:x"` doesn't survive a round trip in this mode.
    ColonHeuristic,
    /// Strings are always text, a URI is only produced by tag 32 or an explicit constructor.
    #[default]
    Explicit,
}

/// Handling of CBOR indefinite-length strings, arrays and maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndefiniteLength {
    #[default]
    Reject,
    Allow,
}

/// Whether a CBOR `NumericDate` must carry tag 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeTag {
    #[default]
    Required,
    /// Also accept a bare integer of epoch seconds.
    Optional,
}

/// Settings shared by all the claim codecs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Config {
    uri_detection: UriDetection,
    indefinite_length: IndefiniteLength,
    time_tag: TimeTag,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            uri_detection: UriDetection::Explicit,
            indefinite_length: IndefiniteLength::Reject,
            time_tag: TimeTag::Required,
        }
    }

    pub const fn with_uri_detection(mut self, uri_detection: UriDetection) -> Self {
        self.uri_detection = uri_detection;

        self
    }

    pub const fn with_indefinite_length(mut self, indefinite_length: IndefiniteLength) -> Self {
        self.indefinite_length = indefinite_length;

        self
    }

    pub const fn with_time_tag(mut self, time_tag: TimeTag) -> Self {
        self.time_tag = time_tag;

        self
    }

    pub const fn uri_detection(&self) -> UriDetection {
        self.uri_detection
    }

    pub const fn indefinite_length(&self) -> IndefiniteLength {
        self.indefinite_length
    }

    pub const fn time_tag(&self) -> TimeTag {
        self.time_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_matches_default() {
        assert_eq!(Config::new(), Config::default());
        assert_eq!(Config::new().uri_detection(), UriDetection::Explicit);
    }

    #[test]
    fn builder_sets_fields() {
        let config = Config::new()
            .with_uri_detection(UriDetection::ColonHeuristic)
            .with_indefinite_length(IndefiniteLength::Allow)
            .with_time_tag(TimeTag::Optional);

        assert_eq!(config.uri_detection(), UriDetection::ColonHeuristic);
        assert_eq!(config.indefinite_length(), IndefiniteLength::Allow);
        assert_eq!(config.time_tag(), TimeTag::Optional);
    }
}
