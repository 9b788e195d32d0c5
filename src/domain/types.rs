//! Shared types for carrier-track

use thiserror::Error;

pub const TRACKING_NUMBER_MIN_LEN: usize = 10;
pub const TRACKING_NUMBER_MAX_LEN: usize = 40;

/// Validated tracking identifier: 10-40 ASCII letters or digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TrackingNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingNumberError {
    #[error("tracking number must be {min}-{max} characters, got {len}", min = TRACKING_NUMBER_MIN_LEN, max = TRACKING_NUMBER_MAX_LEN)]
    Length { len: usize },
    #[error("tracking number contains non-alphanumeric character {0:?}")]
    InvalidChar(char),
}

impl TrackingNumber {
    pub fn parse(raw: &str) -> Result<Self, TrackingNumberError> {
        if let Some(c) = raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(TrackingNumberError::InvalidChar(c));
        }
        // All ASCII past this point, so byte length == char count
        let len = raw.len();
        if !(TRACKING_NUMBER_MIN_LEN..=TRACKING_NUMBER_MAX_LEN).contains(&len) {
            return Err(TrackingNumberError::Length { len });
        }
        Ok(Self(raw.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for TrackingNumber {
    type Err = TrackingNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Raw page content handed from the fetcher to the extractor
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Tracking number the page was requested for
    pub requested: TrackingNumber,
    pub body: String,
}

impl RawDocument {
    pub fn new(requested: TrackingNumber, body: impl Into<String>) -> Self {
        Self { requested, body: body.into() }
    }

    /// Decode a response body, replacing invalid UTF-8 sequences
    pub fn from_bytes(requested: TrackingNumber, bytes: &[u8]) -> Self {
        Self { requested, body: String::from_utf8_lossy(bytes).into_owned() }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_tracking_numbers() {
        let longest = "9".repeat(40);
        for raw in ["9400150105501041088569", "EZ1234567890US", "abcdefghij", longest.as_str()] {
            let number = TrackingNumber::parse(raw).unwrap();
            assert_eq!(number.as_str(), raw);
            assert_eq!(number.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert_eq!(TrackingNumber::parse("123456789"), Err(TrackingNumberError::Length { len: 9 }));
        assert_eq!(
            TrackingNumber::parse(&"A".repeat(41)),
            Err(TrackingNumberError::Length { len: 41 })
        );
        assert_eq!(TrackingNumber::parse(""), Err(TrackingNumberError::Length { len: 0 }));
    }

    #[test]
    fn test_parse_rejects_non_alphanumeric() {
        assert_eq!(
            TrackingNumber::parse("9400-1501-0550"),
            Err(TrackingNumberError::InvalidChar('-'))
        );
        assert_eq!(
            TrackingNumber::parse("94001501055ü1041"),
            Err(TrackingNumberError::InvalidChar('ü'))
        );
        assert!(TrackingNumber::parse("9400150105 501041088569").is_err());
        assert!("../etc/passwd1234".parse::<TrackingNumber>().is_err());
    }

    #[test]
    fn test_raw_document_lossy_decode() {
        let number = TrackingNumber::parse("EZ1234567890US").unwrap();
        let doc = RawDocument::from_bytes(number, b"<p>ok\xff</p>");
        assert!(doc.body.starts_with("<p>ok"));
        assert!(!doc.is_empty());
    }
}
