use gradebook::access::Actor;
use gradebook::config::{load_config, write_starter_config};
use gradebook::gradebook::{
    load_gradebook, save_gradebook, GradeSubmission, GradeValue, Gradebook, GradebookError,
    NpStatus, SemesterRemark,
};
use gradebook::grading::{compute_cgpa, compute_term_gpa, CreditedPoint, Score, ScoringError};

fn score(term: &str, student_id: u64, course_id: u64, value: f64) -> GradeSubmission {
    GradeSubmission {
        student_id,
        course_id,
        term: term.to_string(),
        value: GradeValue::Score(Score::new(value).unwrap()),
    }
}

#[test]
fn test_two_terms_through_storage() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    write_starter_config(&config_path, false).unwrap();
    let scale = load_config(Some(config_path)).unwrap().grade_scale().unwrap();

    let lecturer = Actor::lecturer();
    let mut book = Gradebook::new();
    let student = book
        .add_student(&lecturer, "Tolu Bankole", "tolu@example.com")
        .unwrap();
    let maths = book
        .add_course(&lecturer, "MTH101", "Elementary Mathematics I", 3.0, None)
        .unwrap();
    let chem = book
        .add_course(&lecturer, "CHM101", "General Chemistry I", 1.0, None)
        .unwrap();

    book.submit_batch(
        &lecturer,
        &scale,
        &[score("2024-1", student, maths, 93.0), score("2024-2", student, chem, 71.0)],
    )
    .unwrap();

    let path = dir.path().join("gradebook.json");
    save_gradebook(&path, &book).unwrap();
    let mut book = load_gradebook(&path).unwrap();

    // CGPA spans every course, not an average of term GPAs
    assert_eq!(book.term_gpa(&Actor::admin(), student, "2024-1").unwrap(), 4.0);
    assert_eq!(book.term_gpa(&Actor::admin(), student, "2024-2").unwrap(), 2.0);
    assert_eq!(book.cgpa(&Actor::admin(), student).unwrap(), 3.5);

    let report = book.gpa_report(&Actor::admin(), student).unwrap();
    assert_eq!(report.term.as_deref(), Some("2024-2"));
    assert_eq!(report.gpa, 2.0);
    assert_eq!(report.cgpa, 3.5);

    // Replacing the chemistry grade with a fail
    book.submit_grade(&lecturer, &scale, &score("2024-2", student, chem, 30.0))
        .unwrap();
    assert_eq!(book.cgpa(&Actor::admin(), student).unwrap(), 3.0);
    assert_eq!(
        book.semester_remark(&Actor::admin(), student).unwrap(),
        SemesterRemark::AttentionNeeded
    );
    let transcript = book.transcript(&Actor::admin(), student).unwrap();
    assert_eq!(transcript.terms[1].rows[0].np_status, NpStatus::CarryOver);
}

#[test]
fn test_rejected_writes_leave_state_untouched() {
    let admin = Actor::admin();
    let scale = Default::default();
    let mut book = Gradebook::new();
    let student = book.add_student(&admin, "Kemi Ade", "kemi@example.com").unwrap();
    let course = book
        .add_course(&admin, "PHY101", "General Physics I", 2.0, None)
        .unwrap();

    let err = book
        .submit_batch(
            &admin,
            &scale,
            &[score("2024-1", student, course, 70.0), score("2024-1", 99, course, 70.0)],
        )
        .unwrap_err();
    assert!(err.is_association());
    assert!(book.grades().is_empty());

    let err = book
        .submit_grade(&Actor::student(student), &scale, &score("2024-1", student, course, 90.0))
        .unwrap_err();
    assert!(matches!(err, GradebookError::Forbidden(_)));
    assert!(book.grades().is_empty());

    let err = book.add_course(&admin, "ZRO100", "No Credit", 0.0, None).unwrap_err();
    assert!(matches!(
        err,
        GradebookError::Scoring(ScoringError::InvalidCreditUnits { .. })
    ));
    assert_eq!(book.cgpa(&Actor::admin(), student).unwrap(), 0.0);
}

#[test]
fn test_engine_helpers() {
    assert_eq!(compute_term_gpa(&[]).unwrap(), 0.0);
    let points = [CreditedPoint::new(3.0, 4.0), CreditedPoint::new(3.0, 3.0)];
    assert_eq!(compute_term_gpa(&points).unwrap(), 3.5);
    assert_eq!(compute_cgpa(&points).unwrap(), 3.5);
}
