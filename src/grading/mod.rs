pub mod engine;
pub mod error;
pub mod scale;
pub mod score;
pub mod validation;

pub use engine::{
    classify, classify_score, compute_cgpa, compute_gpa, compute_term_gpa, round_half_up,
    summarize_cumulative, summarize_term, Classification, CreditedPoint, CumulativeSummary,
    TermSummary,
};
pub use error::ScoringError;
pub use scale::{default_bands, GradeBand, GradeScale};
pub use score::Score;
pub use validation::validate_scale;
