use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::gradebook::{CourseReview, GpaReport, NpStatus, Transcript};
use crate::grading::{Classification, GradeScale};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// GPAs always show two decimals ("3.50", "0.00")
pub fn format_gpa(gpa: f64) -> String {
    format!("{:.2}", gpa)
}

/// Credit units without a trailing ".0" for whole numbers ("3", "1.5")
pub fn format_credits(credit_units: f64) -> String {
    if credit_units.fract() == 0.0 {
        format!("{:.0}", credit_units)
    } else {
        format!("{}", credit_units)
    }
}

fn paint_letter(letter: &str, grade_point: f64, use_colors: bool) -> String {
    if !use_colors {
        return letter.to_string();
    }
    if grade_point >= 3.0 {
        letter.green().bold().to_string()
    } else if grade_point > 0.0 {
        letter.yellow().to_string()
    } else {
        letter.red().bold().to_string()
    }
}

/// Format a single classification result.
/// Format: "{score} -> {letter} ({points} pts)"
pub fn format_classification(score: f64, result: &Classification, use_colors: bool) -> String {
    format!(
        "{} -> {} ({:.1} pts)",
        score,
        paint_letter(&result.letter, result.grade_point, use_colors),
        result.grade_point
    )
}

/// Format the bands of a grade scale, highest first
pub fn format_scale(scale: &GradeScale) -> String {
    let bands = scale.bands();
    bands
        .iter()
        .enumerate()
        .map(|(i, band)| {
            let upper = if i == 0 {
                "100".to_string()
            } else {
                format!("<{}", bands[i - 1].min_score)
            };
            format!(
                "{:>5} - {:<5} {:<3} {:.1}",
                band.min_score, upper, band.letter, band.points
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a course name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format a student's transcript: one block per term with its GPA, then
/// the cumulative line.
///
/// Row columns: code, credits, value, letter, points, status, name.
/// The name column is last so it can be truncated to the terminal width.
pub fn format_transcript(transcript: &Transcript, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let header = format!(
        "{} <{}>",
        transcript.student.name, transcript.student.email
    );
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    if transcript.terms.is_empty() {
        lines.push("No grades recorded.".to_string());
        lines.push(format!("Remark: {}", transcript.remark));
        return lines.join("\n");
    }

    let term_width = get_terminal_width();
    // code(8) + credits(4) + value(6) + letter(3) + points(4) + status(2) + 6 separators of 2
    let fixed_width = 8 + 4 + 6 + 3 + 4 + 2 + 12;

    for term in &transcript.terms {
        lines.push(String::new());
        let term_header = format!("Term {}", term.summary.term);
        lines.push(if use_colors {
            term_header.underline().to_string()
        } else {
            term_header
        });

        for row in &term.rows {
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&row.course_name, width - fixed_width)
                }
                Some(_) => truncate_name(&row.course_name, 20),
                None => row.course_name.clone(),
            };
            let status = if use_colors && row.np_status == NpStatus::CarryOver {
                row.np_status.code().red().to_string()
            } else {
                row.np_status.code().to_string()
            };
            // Pad before painting so escape codes don't skew alignment
            let letter = format!("{:<3}", row.letter);
            lines.push(format!(
                "  {:<8}  {:>4}  {:>6}  {}  {:>4.1}  {}  {}",
                row.course_code,
                format_credits(row.credit_units),
                row.value.to_string(),
                paint_letter(&letter, row.grade_point, use_colors),
                row.grade_point,
                status,
                name
            ));
        }

        lines.push(format!(
            "  GPA {} over {} credits",
            format_gpa(term.summary.gpa),
            format_credits(term.summary.total_credits)
        ));
    }

    lines.push(String::new());
    let cgpa = format!(
        "CGPA {} over {} credits",
        format_gpa(transcript.cgpa),
        format_credits(transcript.total_credits)
    );
    lines.push(if use_colors {
        cgpa.bold().to_string()
    } else {
        cgpa
    });
    lines.push(format!("Remark: {}", transcript.remark));

    lines.join("\n")
}

/// Format a GPA report as a single line
pub fn format_gpa_report(report: &GpaReport) -> String {
    let term = report.term.as_deref().unwrap_or("-");
    format!(
        "{} (#{}): GPA {} (term {}), CGPA {}",
        report.student_name,
        report.student_id,
        format_gpa(report.gpa),
        term,
        format_gpa(report.cgpa)
    )
}

/// Format course reviews, one per line, newest first
pub fn format_reviews(reviews: &[&CourseReview], average: Option<f64>) -> String {
    if reviews.is_empty() {
        return "No reviews yet.".to_string();
    }

    let mut sorted: Vec<&CourseReview> = reviews.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut lines: Vec<String> = sorted
        .iter()
        .map(|r| {
            format!(
                "#{} {}{} by student {} on {}: {}",
                r.id,
                "*".repeat(r.rating as usize),
                " ".repeat(5 - r.rating.min(5) as usize),
                r.student_id,
                r.created_at.format("%Y-%m-%d"),
                r.comment
            )
        })
        .collect();

    if let Some(avg) = average {
        lines.push(format!("Average rating: {} ({} reviews)", format_gpa(avg), reviews.len()));
    }
    lines.join("\n")
}
