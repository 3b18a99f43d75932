use crate::error::AliasViolation;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short code identifying a shortened URL.
///
/// Codes are case-sensitive. Custom aliases must be 3-20 characters long and
/// contain only alphanumeric characters, hyphens, or underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

pub const MIN_LENGTH: usize = 3;
pub const MAX_LENGTH: usize = 20;

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input against the alias policy.
    pub fn new(code: impl Into<String>) -> Result<Self, AliasViolation> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this for codes produced by trusted internal sources (generators,
    /// rows read back from storage) or for lookups, where an unknown code
    /// simply resolves to nothing.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Checks a candidate alias against the alias policy.
    pub fn validate(code: &str) -> Result<(), AliasViolation> {
        if code.is_empty() {
            return Err(AliasViolation::Empty);
        }

        // the allowed alphabet is ASCII, so byte length equals char count once
        // the character check passes; check characters first
        if let Some(c) = code
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(AliasViolation::InvalidCharacter(c));
        }

        let len = code.len();
        if len < MIN_LENGTH {
            return Err(AliasViolation::TooShort {
                len,
                min: MIN_LENGTH,
            });
        }
        if len > MAX_LENGTH {
            return Err(AliasViolation::TooLong {
                len,
                max: MAX_LENGTH,
            });
        }

        Ok(())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codes() {
        assert!(ShortCode::new("abc").is_ok());
        assert!(ShortCode::new("Abc-123_xyz").is_ok());
        assert!(ShortCode::new("a".repeat(20)).is_ok());
    }

    #[test]
    fn empty() {
        assert_eq!(ShortCode::new(""), Err(AliasViolation::Empty));
    }

    #[test]
    fn too_short() {
        assert_eq!(
            ShortCode::new("ab"),
            Err(AliasViolation::TooShort { len: 2, min: 3 })
        );
    }

    #[test]
    fn too_long() {
        assert_eq!(
            ShortCode::new("a".repeat(21)),
            Err(AliasViolation::TooLong { len: 21, max: 20 })
        );
    }

    #[test]
    fn invalid_characters() {
        assert_eq!(
            ShortCode::new("abc def"),
            Err(AliasViolation::InvalidCharacter(' '))
        );
        assert_eq!(
            ShortCode::new("abc/def"),
            Err(AliasViolation::InvalidCharacter('/'))
        );
        assert_eq!(
            ShortCode::new("café"),
            Err(AliasViolation::InvalidCharacter('é'))
        );
    }

    #[test]
    fn codes_are_case_sensitive() {
        let lower = ShortCode::new("abc").unwrap();
        let upper = ShortCode::new("ABC").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn to_url() {
        let code = ShortCode::new("abc123").unwrap();
        assert_eq!(code.to_url("https://teth.er"), "https://teth.er/abc123");
        assert_eq!(code.to_url("https://teth.er/"), "https://teth.er/abc123");
    }

    #[test]
    fn serializes_as_plain_string() {
        let code = ShortCode::new("my-code").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"my-code\"");
    }
}
