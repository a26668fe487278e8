pub mod book;
pub mod enrollment;
pub mod error;
pub mod filter;
pub mod reviews;
pub mod storage;
pub mod summary;
pub mod types;

pub use book::{Gradebook, GRADEBOOK_VERSION};
pub use error::GradebookError;
pub use filter::{grades_for_student, grades_in_term, latest_term, terms_for_student};
pub use storage::{get_gradebook_path, load_gradebook, save_gradebook};
pub use summary::{Transcript, TranscriptRow, TranscriptTerm};
pub use types::{
    Course, CourseReview, Enrollment, GpaReport, Grade, GradeSubmission, GradeValue, NpStatus,
    SemesterRemark, Student, SubmitOutcome,
};
