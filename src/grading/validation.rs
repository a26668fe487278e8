use super::scale::GradeBand;
use super::score::Score;

/// Validate a grade scale definition.
/// Returns all validation errors at once (not just the first).
///
/// Bands are defined by their inclusive lower bound, so the scale covers
/// `[0, 100]` without gaps exactly when one band starts at 0 and every bound
/// lies inside the range. Two bands sharing a bound overlap.
pub fn validate_scale(bands: &[GradeBand]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if bands.is_empty() {
        errors.push("scale: at least one band is required".to_string());
        return Err(errors);
    }

    for (i, band) in bands.iter().enumerate() {
        if !band.min_score.is_finite() || band.min_score < Score::MIN || band.min_score > Score::MAX
        {
            errors.push(format!(
                "scale[{}].min_score: {} must be between {} and {}",
                i,
                band.min_score,
                Score::MIN,
                Score::MAX
            ));
        }

        if band.letter.trim().is_empty() {
            errors.push(format!("scale[{}].letter: must not be empty", i));
        }

        if !band.points.is_finite() || band.points < 0.0 {
            errors.push(format!(
                "scale[{}].points: {} must be a non-negative number",
                i, band.points
            ));
        }

        for (j, other) in bands.iter().enumerate().skip(i + 1) {
            if band.min_score == other.min_score {
                errors.push(format!(
                    "scale[{}] and scale[{}]: both start at {} (overlapping bands)",
                    i, j, band.min_score
                ));
            }
            if !band.letter.trim().is_empty()
                && band.letter.trim().eq_ignore_ascii_case(other.letter.trim())
            {
                errors.push(format!(
                    "scale[{}] and scale[{}]: duplicate letter '{}'",
                    i, j, band.letter
                ));
            }
        }
    }

    let lowest = bands
        .iter()
        .map(|b| b.min_score)
        .fold(f64::INFINITY, f64::min);
    if lowest != Score::MIN {
        errors.push(format!(
            "scale: scores below {} are not covered (lowest band must start at {})",
            lowest,
            Score::MIN
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradeScale;

    fn band(min_score: f64, letter: &str, points: f64) -> GradeBand {
        GradeBand {
            min_score,
            letter: letter.to_string(),
            points,
        }
    }

    #[test]
    fn test_default_scale_is_valid() {
        let scale = GradeScale::default();
        assert!(validate_scale(scale.bands()).is_ok());
    }

    #[test]
    fn test_empty_scale() {
        let errors = validate_scale(&[]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least one band"));
    }

    #[test]
    fn test_gap_at_bottom() {
        let errors = validate_scale(&[band(50.0, "P", 1.0), band(80.0, "H", 2.0)]).unwrap_err();
        assert!(errors[0].contains("not covered"));
    }

    #[test]
    fn test_overlapping_bounds() {
        let errors = validate_scale(&[
            band(0.0, "F", 0.0),
            band(50.0, "P", 1.0),
            band(50.0, "Q", 1.5),
        ])
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("scale[1] and scale[2]"));
    }

    #[test]
    fn test_bound_above_range() {
        let errors = validate_scale(&[band(0.0, "F", 0.0), band(101.0, "A+", 5.0)]).unwrap_err();
        assert!(errors[0].contains("scale[1].min_score"));
    }

    #[test]
    fn test_duplicate_letter_case_insensitive() {
        let errors = validate_scale(&[band(0.0, "F", 0.0), band(40.0, "f", 0.5)]).unwrap_err();
        assert!(errors[0].contains("duplicate letter"));
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = validate_scale(&[
            band(10.0, "", -1.0),     // empty letter, negative points, gap below 10
            band(f64::NAN, "B", 3.0), // non-finite bound
        ])
        .unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
