use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grading::{classify_score, Classification, GradeScale, Score, ScoringError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub code: String,
    pub name: String,
    pub credit_units: f64,
    #[serde(default)]
    pub lecturer: Option<String>,
}

/// What was submitted for a grade: a raw score or a directly assigned
/// letter. Exactly one of the two, never both.
///
/// Serialized as `{ score: 85 }` or `{ letter: "B" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeValue {
    Score(Score),
    Letter(String),
}

impl GradeValue {
    /// Build a value from optional score and letter fields. Exactly one must
    /// be present; neither is preferred over the other.
    pub fn from_parts(score: Option<Score>, letter: Option<String>) -> Result<Self, ScoringError> {
        match (score, letter) {
            (Some(score), None) => Ok(GradeValue::Score(score)),
            (None, Some(letter)) => Ok(GradeValue::Letter(letter)),
            (Some(_), Some(_)) => Err(ScoringError::ScoreAndLetter),
            (None, None) => Err(ScoringError::MissingGradeValue),
        }
    }

    pub fn classify(&self, scale: &GradeScale) -> Result<Classification, ScoringError> {
        match self {
            GradeValue::Score(score) => classify_score(*score, scale),
            GradeValue::Letter(letter) => {
                let band = scale.band_for_letter(letter)?;
                Ok(Classification {
                    letter: band.letter.clone(),
                    grade_point: band.points,
                })
            }
        }
    }
}

impl fmt::Display for GradeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeValue::Score(score) => write!(f, "{}", score),
            GradeValue::Letter(letter) => write!(f, "{}", letter),
        }
    }
}

/// Progress status of a single grade: passing grades keep normal progress,
/// a failed course is carried over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpStatus {
    #[serde(rename = "NP")]
    NormalProgress,
    #[serde(rename = "CO")]
    CarryOver,
}

impl NpStatus {
    pub fn from_grade_point(grade_point: f64) -> Self {
        if grade_point > 0.0 {
            NpStatus::NormalProgress
        } else {
            NpStatus::CarryOver
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            NpStatus::NormalProgress => "NP",
            NpStatus::CarryOver => "CO",
        }
    }
}

/// A stored grade. `letter`, `grade_point` and `np_status` are derived from
/// `value` when the grade is written, so later scale edits do not rewrite
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub student_id: u64,
    pub course_id: u64,
    pub term: String,
    pub value: GradeValue,
    pub letter: String,
    pub grade_point: f64,
    pub np_status: NpStatus,
    pub recorded_at: DateTime<Utc>,
}

impl Grade {
    pub fn matches(&self, student_id: u64, course_id: u64, term: &str) -> bool {
        self.student_id == student_id && self.course_id == course_id && self.term == term
    }
}

/// A grade write request, before validation.
///
/// On the wire the value is a sibling `score` or `letter` key:
/// `{ student_id: 1, course_id: 2, term: "2024-1", score: 85 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSubmission", into = "RawSubmission")]
pub struct GradeSubmission {
    pub student_id: u64,
    pub course_id: u64,
    pub term: String,
    pub value: GradeValue,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSubmission {
    student_id: u64,
    course_id: u64,
    term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    letter: Option<String>,
}

impl TryFrom<RawSubmission> for GradeSubmission {
    type Error = ScoringError;

    fn try_from(raw: RawSubmission) -> Result<Self, Self::Error> {
        Ok(Self {
            student_id: raw.student_id,
            course_id: raw.course_id,
            term: raw.term,
            value: GradeValue::from_parts(raw.score, raw.letter)?,
        })
    }
}

impl From<GradeSubmission> for RawSubmission {
    fn from(submission: GradeSubmission) -> Self {
        let (score, letter) = match submission.value {
            GradeValue::Score(score) => (Some(score), None),
            GradeValue::Letter(letter) => (None, Some(letter)),
        };
        Self {
            student_id: submission.student_id,
            course_id: submission.course_id,
            term: submission.term,
            score,
            letter,
        }
    }
}

/// A student's registration in a course, independent of any grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: u64,
    pub course_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseReview {
    pub id: u64,
    pub course_id: u64,
    pub student_id: u64,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Whether a grade write created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

/// Overall standing shown alongside a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SemesterRemark {
    NoGrades,
    NormalProgress,
    AttentionNeeded,
}

impl fmt::Display for SemesterRemark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SemesterRemark::NoGrades => "No grades yet",
            SemesterRemark::NormalProgress => "Normal Progress",
            SemesterRemark::AttentionNeeded => "Attention Needed",
        };
        f.write_str(text)
    }
}

/// GPA payload for a student: latest-term GPA plus CGPA.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpaReport {
    pub student_id: u64,
    pub student_name: String,
    pub term: Option<String>,
    pub gpa: f64,
    pub cgpa: f64,
}
