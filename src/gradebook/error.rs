use thiserror::Error;

use crate::access::AccessDenied;
use crate::grading::ScoringError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradebookError {
    #[error("student {0} does not exist")]
    UnknownStudent(u64),

    #[error("course {0} does not exist")]
    UnknownCourse(u64),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Forbidden(#[from] AccessDenied),

    #[error("course {course_id} already has grades; its credit units cannot change")]
    CourseInUse { course_id: u64 },

    #[error("student {student_id} already has grades and cannot be removed")]
    StudentInUse { student_id: u64 },

    #[error("student {student_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled { student_id: u64, course_id: u64 },

    #[error("student {student_id} is not enrolled in course {course_id}")]
    NotEnrolled { student_id: u64, course_id: u64 },

    #[error("a student with email '{0}' already exists")]
    DuplicateStudent(String),

    #[error("a course with code '{0}' already exists")]
    DuplicateCourse(String),

    #[error("no grade for student {student_id} in course {course_id} for term '{term}'")]
    GradeNotFound {
        student_id: u64,
        course_id: u64,
        term: String,
    },

    #[error("review {0} does not exist")]
    ReviewNotFound(u64),

    #[error("rating {0} is invalid: must be between 1 and 5")]
    InvalidRating(u8),

    #[error("term label must not be empty")]
    EmptyTerm,
}

impl GradebookError {
    /// True for failures caused by a reference to a record that does not
    /// exist (unknown student/course in a grade submission).
    pub fn is_association(&self) -> bool {
        matches!(
            self,
            GradebookError::UnknownStudent(_) | GradebookError::UnknownCourse(_)
        )
    }
}
