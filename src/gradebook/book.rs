use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{info, warn};

use super::error::GradebookError;
use super::types::{
    Course, CourseReview, Enrollment, Grade, GradeSubmission, NpStatus, Student, SubmitOutcome,
};
use crate::access::{authorize, Action, Actor};
use crate::grading::{GradeScale, ScoringError};

pub const GRADEBOOK_VERSION: u32 = 1;

/// In-memory record of students, courses, enrollments, grades and reviews.
///
/// Holds at most one grade per (student, course, term). Writes take
/// `&mut self`, so they are serialized by the borrow checker; storage is
/// handled separately by [`super::storage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gradebook {
    pub(super) version: u32,
    #[serde(default)]
    pub(super) students: BTreeMap<u64, Student>,
    #[serde(default)]
    pub(super) courses: BTreeMap<u64, Course>,
    #[serde(default)]
    pub(super) enrollments: BTreeSet<Enrollment>,
    #[serde(default)]
    pub(super) grades: Vec<Grade>,
    #[serde(default)]
    pub(super) reviews: Vec<CourseReview>,
}

impl Default for Gradebook {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn check_credit_units(credit_units: f64) -> Result<(), ScoringError> {
    if credit_units.is_finite() && credit_units > 0.0 {
        Ok(())
    } else {
        Err(ScoringError::InvalidCreditUnits { credit_units })
    }
}

impl Gradebook {
    pub fn new() -> Self {
        Self {
            version: GRADEBOOK_VERSION,
            students: BTreeMap::new(),
            courses: BTreeMap::new(),
            enrollments: BTreeSet::new(),
            grades: Vec::new(),
            reviews: Vec::new(),
        }
    }

    /// Storage format version this gradebook was written with.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn student(&self, id: u64) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn course(&self, id: u64) -> Option<&Course> {
        self.courses.get(&id)
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    pub fn grades(&self) -> &[Grade] {
        &self.grades
    }

    pub(super) fn require_student(&self, id: u64) -> Result<&Student, GradebookError> {
        self.students
            .get(&id)
            .ok_or(GradebookError::UnknownStudent(id))
    }

    pub(super) fn require_course(&self, id: u64) -> Result<&Course, GradebookError> {
        self.courses.get(&id).ok_or(GradebookError::UnknownCourse(id))
    }

    /// Register a student. Emails are unique (case-insensitive).
    pub fn add_student(
        &mut self,
        actor: &Actor,
        name: &str,
        email: &str,
    ) -> Result<u64, GradebookError> {
        authorize(actor, Action::ManageStudents)?;

        if self
            .students
            .values()
            .any(|s| s.email.eq_ignore_ascii_case(email))
        {
            return Err(GradebookError::DuplicateStudent(email.to_string()));
        }

        let id = self.students.keys().next_back().map_or(1, |last| last + 1);
        self.students.insert(
            id,
            Student {
                id,
                name: name.to_string(),
                email: email.to_string(),
            },
        );
        info!(student_id = id, "added student");
        Ok(id)
    }

    /// Register a course. Codes are unique (case-insensitive) and credit
    /// units must be positive.
    pub fn add_course(
        &mut self,
        actor: &Actor,
        code: &str,
        name: &str,
        credit_units: f64,
        lecturer: Option<String>,
    ) -> Result<u64, GradebookError> {
        authorize(actor, Action::ManageCourses)?;
        check_credit_units(credit_units)?;

        if self
            .courses
            .values()
            .any(|c| c.code.eq_ignore_ascii_case(code))
        {
            return Err(GradebookError::DuplicateCourse(code.to_string()));
        }

        let id = self.courses.keys().next_back().map_or(1, |last| last + 1);
        self.courses.insert(
            id,
            Course {
                id,
                code: code.to_string(),
                name: name.to_string(),
                credit_units,
                lecturer,
            },
        );
        info!(course_id = id, code, credit_units, "added course");
        Ok(id)
    }

    /// Change a student's name and/or email. The email stays unique.
    pub fn update_student(
        &mut self,
        actor: &Actor,
        student_id: u64,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), GradebookError> {
        authorize(actor, Action::ManageStudents)?;
        self.require_student(student_id)?;

        if let Some(email) = email {
            if self
                .students
                .values()
                .any(|s| s.id != student_id && s.email.eq_ignore_ascii_case(email))
            {
                return Err(GradebookError::DuplicateStudent(email.to_string()));
            }
        }

        if let Some(student) = self.students.get_mut(&student_id) {
            if let Some(name) = name {
                student.name = name.to_string();
            }
            if let Some(email) = email {
                student.email = email.to_string();
            }
        }
        info!(student_id, "updated student");
        Ok(())
    }

    /// Delete a student without grades. Their enrollments and reviews go
    /// with them.
    pub fn remove_student(
        &mut self,
        actor: &Actor,
        student_id: u64,
    ) -> Result<Student, GradebookError> {
        authorize(actor, Action::ManageStudents)?;
        self.require_student(student_id)?;

        if self.grades.iter().any(|g| g.student_id == student_id) {
            warn!(student_id, "refused removal of graded student");
            return Err(GradebookError::StudentInUse { student_id });
        }

        self.enrollments.retain(|e| e.student_id != student_id);
        self.reviews.retain(|r| r.student_id != student_id);
        info!(student_id, "removed student");
        self.students
            .remove(&student_id)
            .ok_or(GradebookError::UnknownStudent(student_id))
    }

    /// Change a course's code, name or lecturer. Credit units have their
    /// own operation.
    pub fn update_course(
        &mut self,
        actor: &Actor,
        course_id: u64,
        code: Option<&str>,
        name: Option<&str>,
        lecturer: Option<String>,
    ) -> Result<(), GradebookError> {
        authorize(actor, Action::ManageCourses)?;
        self.require_course(course_id)?;

        if let Some(code) = code {
            if self
                .courses
                .values()
                .any(|c| c.id != course_id && c.code.eq_ignore_ascii_case(code))
            {
                return Err(GradebookError::DuplicateCourse(code.to_string()));
            }
        }

        if let Some(course) = self.courses.get_mut(&course_id) {
            if let Some(code) = code {
                course.code = code.to_string();
            }
            if let Some(name) = name {
                course.name = name.to_string();
            }
            if lecturer.is_some() {
                course.lecturer = lecturer;
            }
        }
        info!(course_id, "updated course");
        Ok(())
    }

    /// Delete a course nobody has been graded in. Enrollments and reviews
    /// of the course are dropped.
    pub fn remove_course(&mut self, actor: &Actor, course_id: u64) -> Result<Course, GradebookError> {
        authorize(actor, Action::ManageCourses)?;
        self.require_course(course_id)?;

        if self.grades.iter().any(|g| g.course_id == course_id) {
            warn!(course_id, "refused removal of graded course");
            return Err(GradebookError::CourseInUse { course_id });
        }

        self.enrollments.retain(|e| e.course_id != course_id);
        self.reviews.retain(|r| r.course_id != course_id);
        info!(course_id, "removed course");
        self.courses
            .remove(&course_id)
            .ok_or(GradebookError::UnknownCourse(course_id))
    }

    /// Change a course's credit weight. Refused once any grade references
    /// the course, so historical GPAs stay reproducible.
    pub fn set_course_credits(
        &mut self,
        actor: &Actor,
        course_id: u64,
        credit_units: f64,
    ) -> Result<(), GradebookError> {
        authorize(actor, Action::ManageCourses)?;
        check_credit_units(credit_units)?;
        self.require_course(course_id)?;

        if self.grades.iter().any(|g| g.course_id == course_id) {
            warn!(course_id, "refused credit change on graded course");
            return Err(GradebookError::CourseInUse { course_id });
        }

        if let Some(course) = self.courses.get_mut(&course_id) {
            course.credit_units = credit_units;
        }
        Ok(())
    }

    /// Validation gate: turn a submission into a grade record or fail
    /// without touching stored state.
    fn prepare(
        &self,
        scale: &GradeScale,
        submission: &GradeSubmission,
    ) -> Result<Grade, GradebookError> {
        let term = submission.term.trim();
        if term.is_empty() {
            return Err(GradebookError::EmptyTerm);
        }

        self.require_student(submission.student_id)?;
        let course = self.require_course(submission.course_id)?;
        check_credit_units(course.credit_units)?;

        let classification = submission.value.classify(scale)?;

        Ok(Grade {
            student_id: submission.student_id,
            course_id: submission.course_id,
            term: term.to_string(),
            value: submission.value.clone(),
            np_status: NpStatus::from_grade_point(classification.grade_point),
            letter: classification.letter,
            grade_point: classification.grade_point,
            recorded_at: Utc::now(),
        })
    }

    fn upsert(&mut self, grade: Grade) -> SubmitOutcome {
        let existing = self
            .grades
            .iter()
            .position(|g| g.matches(grade.student_id, grade.course_id, &grade.term));

        info!(
            student_id = grade.student_id,
            course_id = grade.course_id,
            term = %grade.term,
            letter = %grade.letter,
            "recorded grade"
        );

        match existing {
            Some(index) => {
                self.grades[index] = grade;
                SubmitOutcome::Updated
            }
            None => {
                self.grades.push(grade);
                SubmitOutcome::Created
            }
        }
    }

    /// Create or replace the grade for (student, course, term).
    pub fn submit_grade(
        &mut self,
        actor: &Actor,
        scale: &GradeScale,
        submission: &GradeSubmission,
    ) -> Result<SubmitOutcome, GradebookError> {
        authorize(actor, Action::WriteGrades)?;

        let grade = match self.prepare(scale, submission) {
            Ok(grade) => grade,
            Err(e) => {
                warn!(
                    student_id = submission.student_id,
                    course_id = submission.course_id,
                    error = %e,
                    "rejected grade submission"
                );
                return Err(e);
            }
        };

        Ok(self.upsert(grade))
    }

    /// Submit several grades at once. Every submission is validated before
    /// any is applied: one failure leaves the gradebook unchanged.
    pub fn submit_batch(
        &mut self,
        actor: &Actor,
        scale: &GradeScale,
        submissions: &[GradeSubmission],
    ) -> Result<Vec<SubmitOutcome>, GradebookError> {
        authorize(actor, Action::WriteGrades)?;

        let mut prepared = Vec::with_capacity(submissions.len());
        for (i, submission) in submissions.iter().enumerate() {
            match self.prepare(scale, submission) {
                Ok(grade) => prepared.push(grade),
                Err(e) => {
                    warn!(index = i, error = %e, "rejected grade batch");
                    return Err(e);
                }
            }
        }

        Ok(prepared.into_iter().map(|g| self.upsert(g)).collect())
    }

    /// Delete a grade. GPA and CGPA are recomputed from the remaining grades.
    pub fn remove_grade(
        &mut self,
        actor: &Actor,
        student_id: u64,
        course_id: u64,
        term: &str,
    ) -> Result<Grade, GradebookError> {
        authorize(actor, Action::WriteGrades)?;

        let term = term.trim();
        let index = self
            .grades
            .iter()
            .position(|g| g.matches(student_id, course_id, term))
            .ok_or_else(|| GradebookError::GradeNotFound {
                student_id,
                course_id,
                term: term.to_string(),
            })?;

        info!(student_id, course_id, term, "removed grade");
        Ok(self.grades.remove(index))
    }

    /// Check the invariants a loaded gradebook must hold: one grade per
    /// (student, course, term), and no record pointing at a missing student
    /// or course. Every problem is reported.
    pub fn integrity_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (i, grade) in self.grades.iter().enumerate() {
            if !seen.insert((grade.student_id, grade.course_id, grade.term.as_str())) {
                errors.push(format!(
                    "grade #{}: duplicate grade for student {} in course {} for term '{}'",
                    i, grade.student_id, grade.course_id, grade.term
                ));
            }
            if !self.students.contains_key(&grade.student_id) {
                errors.push(format!(
                    "grade #{}: student {} does not exist",
                    i, grade.student_id
                ));
            }
            if !self.courses.contains_key(&grade.course_id) {
                errors.push(format!(
                    "grade #{}: course {} does not exist",
                    i, grade.course_id
                ));
            }
        }

        for enrollment in &self.enrollments {
            if !self.students.contains_key(&enrollment.student_id)
                || !self.courses.contains_key(&enrollment.course_id)
            {
                errors.push(format!(
                    "enrollment of student {} in course {} references a missing record",
                    enrollment.student_id, enrollment.course_id
                ));
            }
        }

        for review in &self.reviews {
            if !self.students.contains_key(&review.student_id)
                || !self.courses.contains_key(&review.course_id)
            {
                errors.push(format!(
                    "review #{} references a missing student or course",
                    review.id
                ));
            }
        }

        for (id, student) in &self.students {
            if student.id != *id {
                errors.push(format!("student key {} holds id {}", id, student.id));
            }
        }
        for (id, course) in &self.courses {
            if course.id != *id {
                errors.push(format!("course key {} holds id {}", id, course.id));
            }
        }

        errors
    }
}
