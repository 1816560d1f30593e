//! Password strength estimation.
//!
//! A character-class heuristic: one point each for a length of at least
//! eight characters, a lowercase letter, an uppercase letter, a digit and a
//! symbol. It is a hint for the member, not a policy; registration only
//! enforces the minimum length.

use serde::Serialize;

const LABELS: [&str; 5] = ["Very Weak", "Weak", "Fair", "Good", "Strong"];
const COLORS: [&str; 5] = ["red", "orange", "yellow", "blue", "green"];

/// Strength score of a candidate password, from 0 to 5.
///
/// ```
/// use loyalty_core::PasswordStrength;
///
/// let strength = PasswordStrength::estimate("Abc12345!");
/// assert_eq!(strength.score(), 5);
/// assert_eq!(strength.label(), "Strong");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PasswordStrength {
    score: u8,
}

impl PasswordStrength {
    /// Highest attainable score.
    pub const MAX_SCORE: u8 = 5;

    /// Length (in characters) that earns the length point.
    pub const MIN_LENGTH: usize = 8;

    /// Score a password.
    #[must_use]
    pub fn estimate(password: &str) -> Self {
        let checks = [
            password.chars().count() >= Self::MIN_LENGTH,
            password.chars().any(|c| c.is_ascii_lowercase()),
            password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
        ];
        let score = checks.iter().filter(|passed| **passed).count();

        Self {
            score: u8::try_from(score)
                .unwrap_or(Self::MAX_SCORE)
                .min(Self::MAX_SCORE),
        }
    }

    /// The raw score.
    #[must_use]
    pub const fn score(self) -> u8 {
        self.score
    }

    // Score 0 shares the first bucket with score 1.
    fn bucket(self) -> usize {
        usize::from(self.score.saturating_sub(1)).min(LABELS.len() - 1)
    }

    /// Human-readable label, "Very Weak" through "Strong".
    #[must_use]
    pub fn label(self) -> &'static str {
        LABELS.get(self.bucket()).copied().unwrap_or("Very Weak")
    }

    /// Display colour matching the label.
    #[must_use]
    pub fn color(self) -> &'static str {
        COLORS.get(self.bucket()).copied().unwrap_or("red")
    }

    /// Serializable summary for API responses.
    #[must_use]
    pub fn report(self) -> StrengthReport {
        StrengthReport {
            score: self.score,
            label: self.label(),
            color: self.color(),
        }
    }
}

/// JSON shape of a strength estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthReport {
    pub score: u8,
    pub label: &'static str,
    pub color: &'static str,
}
