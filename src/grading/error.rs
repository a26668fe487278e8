use thiserror::Error;

/// Failures raised while classifying scores or aggregating grade points.
///
/// An empty set of grades is not an error: aggregation resolves it to a
/// `0.0` GPA.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("score {score} is outside the range 0-100")]
    OutOfRange { score: f64 },

    #[error("'{input}' is not a numeric score")]
    NotNumeric { input: String },

    #[error("invalid credit units {credit_units}: must be a positive number")]
    InvalidCreditUnits { credit_units: f64 },

    #[error("letter grade '{letter}' is not defined by the grade scale")]
    UnknownLetter { letter: String },

    #[error("a grade carries both a score and a letter; give exactly one")]
    ScoreAndLetter,

    #[error("a grade needs either a score or a letter")]
    MissingGradeValue,

    #[error("invalid grade scale: {}", .0.join("; "))]
    InvalidScale(Vec<String>),
}
