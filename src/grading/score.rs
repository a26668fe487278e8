use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ScoringError;

/// A raw assessment score, guaranteed finite and within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Result<Self, ScoringError> {
        if !value.is_finite() {
            return Err(ScoringError::NotNumeric {
                input: value.to_string(),
            });
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ScoringError::OutOfRange { score: value });
        }
        Ok(Score(value))
    }

    /// Parse a score from text, e.g. a CLI argument or an imported cell.
    ///
    /// Text that is not a number fails with `NotNumeric`. Nothing is clamped.
    pub fn parse(s: &str) -> Result<Self, ScoringError> {
        let s = s.trim();
        let value: f64 = s.parse().map_err(|_| ScoringError::NotNumeric {
            input: s.to_string(),
        })?;
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoringError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_score() {
        let score = Score::parse("85").unwrap();
        assert_eq!(score.value(), 85.0);
    }

    #[test]
    fn test_parse_decimal_with_whitespace() {
        let score = Score::parse("  72.5 ").unwrap();
        assert_eq!(score.value(), 72.5);
    }

    #[test]
    fn test_parse_bounds_inclusive() {
        assert!(Score::parse("0").is_ok());
        assert!(Score::parse("100").is_ok());
    }

    #[test]
    fn test_parse_not_numeric() {
        let err = Score::parse("eighty").unwrap_err();
        assert_eq!(
            err,
            ScoringError::NotNumeric {
                input: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_parse_nan_rejected() {
        // "NaN" parses as f64, but is not a usable score
        assert!(matches!(
            Score::parse("NaN"),
            Err(ScoringError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_out_of_range_is_not_clamped() {
        assert_eq!(
            Score::new(100.5).unwrap_err(),
            ScoringError::OutOfRange { score: 100.5 }
        );
        assert_eq!(
            Score::new(-0.1).unwrap_err(),
            ScoringError::OutOfRange { score: -0.1 }
        );
    }

    #[test]
    fn test_infinite_rejected() {
        assert!(matches!(
            Score::new(f64::INFINITY),
            Err(ScoringError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Score = serde_json::from_str("64.0").unwrap();
        assert_eq!(ok.value(), 64.0);
        assert!(serde_json::from_str::<Score>("140").is_err());
    }
}
