use std::collections::BTreeSet;

use super::types::Grade;

/// All grades a student has received, in every term.
pub fn grades_for_student(grades: &[Grade], student_id: u64) -> Vec<&Grade> {
    grades.iter().filter(|g| g.student_id == student_id).collect()
}

/// A student's grades for a single term
pub fn grades_in_term<'a>(grades: &'a [Grade], student_id: u64, term: &str) -> Vec<&'a Grade> {
    grades
        .iter()
        .filter(|g| g.student_id == student_id && g.term == term)
        .collect()
}

/// Distinct terms in which a student holds grades, ordered by label.
pub fn terms_for_student(grades: &[Grade], student_id: u64) -> Vec<String> {
    grades
        .iter()
        .filter(|g| g.student_id == student_id)
        .map(|g| g.term.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn latest_term(grades: &[Grade], student_id: u64) -> Option<String> {
    terms_for_student(grades, student_id).pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradebook::types::{GradeValue, NpStatus};
    use chrono::Utc;

    fn create_test_grade(student_id: u64, course_id: u64, term: &str) -> Grade {
        Grade {
            student_id,
            course_id,
            term: term.to_string(),
            value: GradeValue::Letter("B".to_string()),
            letter: "B".to_string(),
            grade_point: 3.0,
            np_status: NpStatus::NormalProgress,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_grades_for_student() {
        let grades = vec![
            create_test_grade(1, 1, "2024-1"),
            create_test_grade(2, 1, "2024-1"),
            create_test_grade(1, 2, "2024-2"),
        ];
        assert_eq!(grades_for_student(&grades, 1).len(), 2);
        assert_eq!(grades_for_student(&grades, 3).len(), 0);
    }

    #[test]
    fn test_grades_in_term() {
        let grades = vec![
            create_test_grade(1, 1, "2024-1"),
            create_test_grade(1, 2, "2024-1"),
            create_test_grade(1, 3, "2024-2"),
        ];
        let term = grades_in_term(&grades, 1, "2024-1");
        assert_eq!(term.len(), 2);
        assert!(term.iter().all(|g| g.term == "2024-1"));
    }

    #[test]
    fn test_terms_sorted_and_distinct() {
        let grades = vec![
            create_test_grade(1, 1, "2024-2"),
            create_test_grade(1, 2, "2023-1"),
            create_test_grade(1, 3, "2024-2"),
            create_test_grade(2, 3, "2025-1"),
        ];
        assert_eq!(terms_for_student(&grades, 1), vec!["2023-1", "2024-2"]);
        assert_eq!(latest_term(&grades, 1), Some("2024-2".to_string()));
        assert_eq!(latest_term(&grades, 9), None);
    }
}
