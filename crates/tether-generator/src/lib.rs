pub mod random;

pub use random::{random_code, RandomGenerator, DEFAULT_CODE_LENGTH};

use tether_core::{AliasViolation, ShortCode};

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Generated codes are candidates: they may collide with codes that are
/// already taken, and it is up to the caller to retry.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Produces the next candidate short code.
    fn generate(&self) -> Self::Output;
}

/// Validates a caller-chosen alias and turns it into a [`ShortCode`].
///
/// Rejects aliases that are empty, shorter than 3 or longer than 20
/// characters, or that contain characters outside `[A-Za-z0-9_-]`.
pub fn validate_custom_alias(alias: &str) -> Result<ShortCode, AliasViolation> {
    ShortCode::new(alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_alias_passes_through_unchanged() {
        let code = validate_custom_alias("blog-post_2").unwrap();
        assert_eq!(code.as_str(), "blog-post_2");
    }

    #[test]
    fn custom_alias_violations_are_tagged() {
        assert_eq!(validate_custom_alias(""), Err(AliasViolation::Empty));
        assert!(matches!(
            validate_custom_alias("x"),
            Err(AliasViolation::TooShort { .. })
        ));
        assert!(matches!(
            validate_custom_alias(&"x".repeat(64)),
            Err(AliasViolation::TooLong { .. })
        ));
        assert_eq!(
            validate_custom_alias("a?b=c"),
            Err(AliasViolation::InvalidCharacter('?'))
        );
    }
}
