use std::collections::BTreeSet;
use tracing::info;

use super::book::Gradebook;
use super::error::GradebookError;
use super::types::{Course, Enrollment, Student};
use crate::access::{authorize_for_student, Action, Actor};

impl Gradebook {
    /// Register a student in a course. Students may only enroll themselves.
    pub fn enroll(
        &mut self,
        actor: &Actor,
        student_id: u64,
        course_id: u64,
    ) -> Result<(), GradebookError> {
        authorize_for_student(actor, Action::ManageEnrollment, student_id)?;
        self.require_student(student_id)?;
        self.require_course(course_id)?;

        if !self.enrollments.insert(Enrollment {
            student_id,
            course_id,
        }) {
            return Err(GradebookError::AlreadyEnrolled {
                student_id,
                course_id,
            });
        }
        info!(student_id, course_id, "enrolled student");
        Ok(())
    }

    /// Drop a course registration. Grades already recorded are kept.
    pub fn unenroll(
        &mut self,
        actor: &Actor,
        student_id: u64,
        course_id: u64,
    ) -> Result<(), GradebookError> {
        authorize_for_student(actor, Action::ManageEnrollment, student_id)?;
        self.require_student(student_id)?;
        self.require_course(course_id)?;

        if !self.enrollments.remove(&Enrollment {
            student_id,
            course_id,
        }) {
            return Err(GradebookError::NotEnrolled {
                student_id,
                course_id,
            });
        }
        info!(student_id, course_id, "unenrolled student");
        Ok(())
    }

    pub fn is_enrolled(&self, student_id: u64, course_id: u64) -> bool {
        self.enrollments.contains(&Enrollment {
            student_id,
            course_id,
        })
    }

    /// Students attached to a course: the enrolled ones plus anyone holding
    /// a grade in it, each listed once, ordered by id.
    pub fn students_in_course(&self, course_id: u64) -> Result<Vec<&Student>, GradebookError> {
        self.require_course(course_id)?;

        let ids: BTreeSet<u64> = self
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .map(|e| e.student_id)
            .chain(
                self.grades
                    .iter()
                    .filter(|g| g.course_id == course_id)
                    .map(|g| g.student_id),
            )
            .collect();

        Ok(ids.iter().filter_map(|id| self.student(*id)).collect())
    }

    pub fn courses_for_student(&self, student_id: u64) -> Result<Vec<&Course>, GradebookError> {
        self.require_student(student_id)?;
        Ok(self
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id)
            .filter_map(|e| self.course(e.course_id))
            .collect())
    }
}
