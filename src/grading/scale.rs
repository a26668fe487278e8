use serde::{Deserialize, Serialize};

use super::error::ScoringError;
use super::score::Score;
use super::validation::validate_scale;

/// One rule of a grade scale: scores at or above `min_score` (and below the
/// next band's bound) earn `letter` and `points`.
///
/// Example YAML:
/// ```yaml
/// scale:
///   - { min_score: 90, letter: A, points: 4.0 }
///   - { min_score: 80, letter: B, points: 3.0 }
///   - { min_score: 0, letter: F, points: 0.0 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GradeBand {
    /// Inclusive lower bound of the band
    pub min_score: f64,

    /// Letter grade awarded (e.g. "A")
    pub letter: String,

    /// Grade points per credit unit
    pub points: f64,
}

/// A validated grade scale covering every score in `[0, 100]` exactly once.
///
/// The scale is always passed explicitly to classification; there is no
/// process-wide scale.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    // Sorted by min_score, highest first
    bands: Vec<GradeBand>,
}

impl GradeScale {
    pub fn new(mut bands: Vec<GradeBand>) -> Result<Self, ScoringError> {
        validate_scale(&bands).map_err(ScoringError::InvalidScale)?;
        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        Ok(Self { bands })
    }

    /// Bands ordered from the highest threshold to the lowest.
    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    /// Locate the band for a score. Bands are checked from the highest
    /// threshold down, so a boundary score lands in the higher band.
    pub fn band_for(&self, score: Score) -> Option<&GradeBand> {
        self.bands.iter().find(|b| score.value() >= b.min_score)
    }

    /// Look up a directly assigned letter (case-insensitive).
    pub fn band_for_letter(&self, letter: &str) -> Result<&GradeBand, ScoringError> {
        let letter = letter.trim();
        self.bands
            .iter()
            .find(|b| b.letter.eq_ignore_ascii_case(letter))
            .ok_or_else(|| ScoringError::UnknownLetter {
                letter: letter.to_string(),
            })
    }

    pub fn points_for_letter(&self, letter: &str) -> Result<f64, ScoringError> {
        self.band_for_letter(letter).map(|b| b.points)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

/// The standard five-letter scale: A/B/C/D at 90/80/70/60, F below.
pub fn default_bands() -> Vec<GradeBand> {
    [
        (90.0, "A", 4.0),
        (80.0, "B", 3.0),
        (70.0, "C", 2.0),
        (60.0, "D", 1.0),
        (0.0, "F", 0.0),
    ]
    .into_iter()
    .map(|(min_score, letter, points)| GradeBand {
        min_score,
        letter: letter.to_string(),
        points,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scale_bands() {
        let scale = GradeScale::default();
        let letters: Vec<&str> = scale.bands().iter().map(|b| b.letter.as_str()).collect();
        assert_eq!(letters, vec!["A", "B", "C", "D", "F"]);
    }

    #[test]
    fn test_new_sorts_bands_descending() {
        let scale = GradeScale::new(vec![
            GradeBand {
                min_score: 0.0,
                letter: "Fail".to_string(),
                points: 0.0,
            },
            GradeBand {
                min_score: 50.0,
                letter: "Pass".to_string(),
                points: 1.0,
            },
        ])
        .unwrap();
        assert_eq!(scale.bands()[0].letter, "Pass");
        assert_eq!(scale.bands()[1].letter, "Fail");
    }

    #[test]
    fn test_new_rejects_invalid_scale() {
        let result = GradeScale::new(vec![GradeBand {
            min_score: 40.0,
            letter: "P".to_string(),
            points: 1.0,
        }]);
        assert!(matches!(result, Err(ScoringError::InvalidScale(_))));
    }

    #[test]
    fn test_points_for_letter_case_insensitive() {
        let scale = GradeScale::default();
        assert_eq!(scale.points_for_letter("b").unwrap(), 3.0);
        assert_eq!(scale.points_for_letter(" A ").unwrap(), 4.0);
    }

    #[test]
    fn test_points_for_unknown_letter() {
        let scale = GradeScale::default();
        assert_eq!(
            scale.points_for_letter("E").unwrap_err(),
            ScoringError::UnknownLetter {
                letter: "E".to_string()
            }
        );
    }

    #[test]
    fn test_band_yaml_parse() {
        let yaml = r#"
- { min_score: 50, letter: P, points: 1.0 }
- { min_score: 0, letter: F, points: 0 }
"#;
        let bands: Vec<GradeBand> = serde_saphyr::from_str(yaml).unwrap();
        let scale = GradeScale::new(bands).unwrap();
        assert_eq!(scale.bands().len(), 2);
    }
}
