use serde::Serialize;

use super::book::Gradebook;
use super::error::GradebookError;
use super::filter::{grades_for_student, grades_in_term, latest_term, terms_for_student};
use super::types::{GpaReport, Grade, GradeValue, NpStatus, SemesterRemark, Student};
use crate::access::{authorize_for_student, Action, Actor};
use crate::grading::{
    compute_cgpa, compute_term_gpa, summarize_cumulative, CreditedPoint, CumulativeSummary,
    TermSummary,
};

/// One course line on a transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptRow {
    pub course_id: u64,
    pub course_code: String,
    pub course_name: String,
    pub credit_units: f64,
    pub value: GradeValue,
    pub letter: String,
    pub grade_point: f64,
    pub np_status: NpStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptTerm {
    pub summary: TermSummary,
    pub rows: Vec<TranscriptRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub student: Student,
    pub terms: Vec<TranscriptTerm>,
    pub cgpa: f64,
    pub total_credits: f64,
    pub remark: SemesterRemark,
}

impl Gradebook {
    /// Read gate: students see only their own record, staff see any.
    fn readable_student(&self, actor: &Actor, student_id: u64) -> Result<&Student, GradebookError> {
        authorize_for_student(actor, Action::ReadRecords, student_id)?;
        self.require_student(student_id)
    }

    fn credited_points(&self, grades: &[&Grade]) -> Result<Vec<CreditedPoint>, GradebookError> {
        grades
            .iter()
            .map(|g| -> Result<CreditedPoint, GradebookError> {
                let course = self.require_course(g.course_id)?;
                Ok(CreditedPoint::new(course.credit_units, g.grade_point))
            })
            .collect()
    }

    /// GPA for one term. A term without grades yields `0.0`.
    pub fn term_gpa(
        &self,
        actor: &Actor,
        student_id: u64,
        term: &str,
    ) -> Result<f64, GradebookError> {
        self.readable_student(actor, student_id)?;
        let grades = grades_in_term(&self.grades, student_id, term);
        let points = self.credited_points(&grades)?;
        Ok(compute_term_gpa(&points)?)
    }

    /// CGPA from the student's full, current grade history.
    pub fn cgpa(&self, actor: &Actor, student_id: u64) -> Result<f64, GradebookError> {
        self.readable_student(actor, student_id)?;
        let grades = grades_for_student(&self.grades, student_id);
        let points = self.credited_points(&grades)?;
        Ok(compute_cgpa(&points)?)
    }

    pub fn cumulative_summary(
        &self,
        actor: &Actor,
        student_id: u64,
    ) -> Result<CumulativeSummary, GradebookError> {
        self.readable_student(actor, student_id)?;
        let mut terms = Vec::new();
        for term in terms_for_student(&self.grades, student_id) {
            let grades = grades_in_term(&self.grades, student_id, &term);
            let points = self.credited_points(&grades)?;
            terms.push((term, points));
        }
        Ok(summarize_cumulative(&terms)?)
    }

    /// "No grades yet" without grades, "Normal Progress" when nothing is
    /// carried over, "Attention Needed" otherwise.
    pub fn semester_remark(
        &self,
        actor: &Actor,
        student_id: u64,
    ) -> Result<SemesterRemark, GradebookError> {
        self.readable_student(actor, student_id)?;
        let grades = grades_for_student(&self.grades, student_id);
        if grades.is_empty() {
            return Ok(SemesterRemark::NoGrades);
        }
        if grades
            .iter()
            .all(|g| g.np_status == NpStatus::NormalProgress)
        {
            Ok(SemesterRemark::NormalProgress)
        } else {
            Ok(SemesterRemark::AttentionNeeded)
        }
    }

    /// GPA of the latest term (by label) alongside the CGPA.
    pub fn gpa_report(&self, actor: &Actor, student_id: u64) -> Result<GpaReport, GradebookError> {
        let student = self.readable_student(actor, student_id)?;
        let term = latest_term(&self.grades, student_id);
        let gpa = match &term {
            Some(term) => self.term_gpa(actor, student_id, term)?,
            None => 0.0,
        };

        Ok(GpaReport {
            student_id,
            student_name: student.name.clone(),
            term,
            gpa,
            cgpa: self.cgpa(actor, student_id)?,
        })
    }

    pub fn transcript(&self, actor: &Actor, student_id: u64) -> Result<Transcript, GradebookError> {
        let student = self.readable_student(actor, student_id)?.clone();
        let summary = self.cumulative_summary(actor, student_id)?;

        let mut terms = Vec::with_capacity(summary.terms.len());
        for term_summary in summary.terms {
            let mut rows = Vec::new();
            for grade in grades_in_term(&self.grades, student_id, &term_summary.term) {
                let course = self.require_course(grade.course_id)?;
                rows.push(TranscriptRow {
                    course_id: course.id,
                    course_code: course.code.clone(),
                    course_name: course.name.clone(),
                    credit_units: course.credit_units,
                    value: grade.value.clone(),
                    letter: grade.letter.clone(),
                    grade_point: grade.grade_point,
                    np_status: grade.np_status,
                });
            }
            rows.sort_by(|a, b| a.course_code.cmp(&b.course_code));
            terms.push(TranscriptTerm {
                summary: term_summary,
                rows,
            });
        }

        Ok(Transcript {
            student,
            terms,
            cgpa: summary.cgpa,
            total_credits: summary.total_credits,
            remark: self.semester_remark(actor, student_id)?,
        })
    }
}
