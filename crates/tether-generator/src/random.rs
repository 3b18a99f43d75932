use crate::Generator;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tether_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use tether_core::{AliasViolation, ShortCode};

pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Generates one code of `length` characters drawn uniformly from `[A-Za-z0-9]`.
///
/// Fails for lengths a short code may not have (outside 3..=20).
pub fn random_code(length: usize) -> Result<ShortCode, AliasViolation> {
    RandomGenerator::new(length).map(|generator| generator.generate())
}

/// A generator of random alphanumeric short codes of a fixed length.
///
/// With 62 symbols a 6 character code has about 5.7e10 possible values, so
/// collisions are rare but possible.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator for codes of `length` characters.
    ///
    /// The length must lie within the short code bounds, so every generated
    /// code is a valid alias.
    pub fn new(length: usize) -> Result<Self, AliasViolation> {
        if length < MIN_LENGTH {
            return Err(AliasViolation::TooShort {
                len: length,
                min: MIN_LENGTH,
            });
        }
        if length > MAX_LENGTH {
            return Err(AliasViolation::TooLong {
                len: length,
                max: MAX_LENGTH,
            });
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
