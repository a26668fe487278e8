use serde::Serialize;
use tracing::debug;

use super::error::ScoringError;
use super::scale::GradeScale;
use super::score::Score;

// Absorbs binary representation error so that e.g. 2.675 rounds like its
// decimal spelling (up to 2.68) instead of its stored value (2.67499...).
const ROUNDING_TOLERANCE: f64 = 1e-9;

/// Letter grade and grade points for a single score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub letter: String,
    pub grade_point: f64,
}

/// One course's input to a weighted GPA: its credit weight and the grade
/// points earned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditedPoint {
    pub credit_units: f64,
    pub grade_point: f64,
}

impl CreditedPoint {
    pub fn new(credit_units: f64, grade_point: f64) -> Self {
        Self {
            credit_units,
            grade_point,
        }
    }
}

/// Derived view of one term's grades.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermSummary {
    pub term: String,
    pub gpa: f64,
    pub total_credits: f64,
    pub quality_points: f64,
    pub course_count: usize,
}

/// Derived view over a student's whole history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeSummary {
    pub cgpa: f64,
    pub total_credits: f64,
    pub quality_points: f64,
    pub terms: Vec<TermSummary>,
}

/// Classify a raw score against `scale`.
///
/// Fails with `NotNumeric` for NaN/infinite input and `OutOfRange` outside
/// `[0, 100]`.
pub fn classify(score: f64, scale: &GradeScale) -> Result<Classification, ScoringError> {
    classify_score(Score::new(score)?, scale)
}

pub fn classify_score(score: Score, scale: &GradeScale) -> Result<Classification, ScoringError> {
    let band = scale
        .band_for(score)
        .ok_or(ScoringError::OutOfRange {
            score: score.value(),
        })?;

    debug!(score = score.value(), letter = %band.letter, "classified score");

    Ok(Classification {
        letter: band.letter.clone(),
        grade_point: band.points,
    })
}

struct Totals {
    credits: f64,
    quality_points: f64,
    count: usize,
}

fn accumulate(points: &[CreditedPoint]) -> Result<Totals, ScoringError> {
    let mut totals = Totals {
        credits: 0.0,
        quality_points: 0.0,
        count: 0,
    };

    for point in points {
        if !point.credit_units.is_finite() || point.credit_units <= 0.0 {
            return Err(ScoringError::InvalidCreditUnits {
                credit_units: point.credit_units,
            });
        }
        if !point.grade_point.is_finite() {
            return Err(ScoringError::NotNumeric {
                input: point.grade_point.to_string(),
            });
        }
        totals.credits += point.credit_units;
        totals.quality_points += point.grade_point * point.credit_units;
        totals.count += 1;
    }

    Ok(totals)
}

fn weighted_mean(totals: &Totals) -> f64 {
    if totals.credits == 0.0 {
        // Empty transcript: a valid state, reported as 0.0
        return 0.0;
    }
    round_half_up(totals.quality_points / totals.credits, 2)
}

/// Credit-weighted mean of grade points, rounded once to 2 decimals
/// (half-up). Empty input yields `0.0`.
pub fn compute_gpa(points: &[CreditedPoint]) -> Result<f64, ScoringError> {
    let totals = accumulate(points)?;
    let gpa = weighted_mean(&totals);
    debug!(courses = totals.count, credits = totals.credits, gpa, "computed gpa");
    Ok(gpa)
}

/// GPA over the grades of a single term.
pub fn compute_term_gpa(grades_in_term: &[CreditedPoint]) -> Result<f64, ScoringError> {
    compute_gpa(grades_in_term)
}

/// CGPA over every grade a student has received, repeated courses included.
///
/// This is the weighted mean of the merged history. It is NOT the mean of
/// term GPAs, which would be wrong whenever term credit loads differ.
pub fn compute_cgpa(all_grades: &[CreditedPoint]) -> Result<f64, ScoringError> {
    compute_gpa(all_grades)
}

pub fn summarize_term(term: &str, points: &[CreditedPoint]) -> Result<TermSummary, ScoringError> {
    let totals = accumulate(points)?;
    Ok(TermSummary {
        term: term.to_string(),
        gpa: weighted_mean(&totals),
        total_credits: totals.credits,
        quality_points: totals.quality_points,
        course_count: totals.count,
    })
}

/// Summarize each term and the whole history. `terms` should already be in
/// display order.
pub fn summarize_cumulative(
    terms: &[(String, Vec<CreditedPoint>)],
) -> Result<CumulativeSummary, ScoringError> {
    let mut summaries = Vec::with_capacity(terms.len());
    let mut all_points = Vec::new();

    for (term, points) in terms {
        summaries.push(summarize_term(term, points)?);
        all_points.extend_from_slice(points);
    }

    // Recomputed from the merged points, never from the term summaries
    let totals = accumulate(&all_points)?;
    Ok(CumulativeSummary {
        cgpa: weighted_mean(&totals),
        total_credits: totals.credits,
        quality_points: totals.quality_points,
        terms: summaries,
    })
}

/// Round to `places` decimals, ties away from zero.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value.abs() * factor;
    let rounded = (scaled + 0.5 + ROUNDING_TOLERANCE).floor() / factor;
    rounded.copysign(value)
}
