use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use gradebook::access::{AccessDenied, Actor, Role};
use gradebook::config;
use gradebook::gradebook::{
    get_gradebook_path, load_gradebook, save_gradebook, GradeSubmission, GradeValue, Gradebook,
    GradebookError, SubmitOutcome,
};
use gradebook::grading::{classify_score, GradeScale, Score, ScoringError};
use gradebook::output;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_FOUND: i32 = 2;
const EXIT_FORBIDDEN: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_VALIDATION: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a raw score (0-100) into a letter and grade points
    Classify {
        /// Score to classify
        score: String,
    },
    /// Print the active grade scale
    Scale,
    /// Write a starter config with the default A-F scale
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Manage students
    #[command(subcommand)]
    Student(StudentCommand),
    /// Manage courses
    #[command(subcommand)]
    Course(CourseCommand),
    /// Record, replace or remove grades
    #[command(subcommand)]
    Grade(GradeCommand),
    /// Show a student's grades per term with GPA and CGPA
    Transcript {
        student_id: u64,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a student's latest-term GPA and CGPA
    Gpa {
        student_id: u64,
        /// Print JSON instead of a line
        #[arg(long)]
        json: bool,
    },
    /// Course reviews
    #[command(subcommand)]
    Review(ReviewCommand),
}

#[derive(Subcommand, Debug)]
enum StudentCommand {
    /// Register a student
    Add { name: String, email: String },
    /// Change a student's name or email
    Edit {
        student_id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove a student who has no grades
    Rm { student_id: u64 },
    /// Enroll a student in a course
    Enroll { student_id: u64, course_id: u64 },
    /// Drop a student's enrollment in a course
    Unenroll { student_id: u64, course_id: u64 },
    /// List the courses a student is enrolled in
    Courses { student_id: u64 },
    /// List registered students
    List,
}

#[derive(Subcommand, Debug)]
enum CourseCommand {
    /// Register a course
    Add {
        code: String,
        name: String,
        /// Credit units (positive)
        credits: f64,
        #[arg(long)]
        lecturer: Option<String>,
    },
    /// Change a course's code, name or lecturer
    Edit {
        course_id: u64,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        lecturer: Option<String>,
    },
    /// Change a course's credit units (only before any grade exists)
    Credits { course_id: u64, credits: f64 },
    /// Remove a course nobody has been graded in
    Rm { course_id: u64 },
    /// List students enrolled in or graded for a course
    Students { course_id: u64 },
    /// List registered courses
    List,
}

#[derive(Subcommand, Debug)]
enum GradeCommand {
    /// Create or replace the grade for (student, course, term)
    Set {
        student_id: u64,
        course_id: u64,
        term: String,
        /// Raw score, classified with the active scale
        #[arg(long, conflicts_with = "letter", required_unless_present = "letter")]
        score: Option<String>,
        /// Letter assigned directly
        #[arg(long)]
        letter: Option<String>,
    },
    /// Remove a grade
    Rm {
        student_id: u64,
        course_id: u64,
        term: String,
    },
    /// Submit a YAML list of grades; nothing is applied if any entry fails
    Batch { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ReviewCommand {
    /// Review a course (student role)
    Add {
        course_id: u64,
        /// Rating from 1 to 5
        rating: u8,
        #[arg(default_value = "")]
        comment: String,
    },
    /// Change one of your reviews
    Edit {
        review_id: u64,
        rating: u8,
        #[arg(default_value = "")]
        comment: String,
    },
    /// Delete one of your reviews
    Rm { review_id: u64 },
    /// List reviews for a course
    List { course_id: u64 },
}

#[derive(Args, Debug)]
struct ActorArgs {
    /// Role to act as: student, lecturer or admin (required for record access)
    #[arg(long = "as", global = true)]
    role: Option<Role>,

    /// Student record the caller owns (required with --as student)
    #[arg(long = "student-id", global = true)]
    acting_student: Option<u64>,
}

impl ActorArgs {
    fn actor(&self) -> Result<Actor> {
        match (self.role, self.acting_student) {
            (None, _) => anyhow::bail!("this command needs --as <student|lecturer|admin>"),
            (Some(Role::Student), Some(id)) => Ok(Actor::student(id)),
            (Some(Role::Student), None) => anyhow::bail!("--as student requires --student-id"),
            (Some(Role::Lecturer), _) => Ok(Actor::lecturer()),
            (Some(Role::Admin), _) => Ok(Actor::admin()),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gradebook")]
#[command(about = "Student grade records with GPA/CGPA computation", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Path to config file (defaults to ~/.config/gradebook/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    actor: ActorArgs,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = gradebook::logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())
    {
        eprintln!("Logging error: {:#}", e);
        std::process::exit(EXIT_CONFIG);
    }

    if let Commands::Init { force } = cli.command {
        let code = match init_config(cli.config, force) {
            Ok(path) => {
                println!("Wrote config to {}", path.display());
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_CONFIG
            }
        };
        std::process::exit(code);
    }

    let config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate the grade scale at startup
    let scale = match config.grade_scale() {
        Ok(scale) => scale,
        Err(ScoringError::InvalidScale(errors)) => {
            eprintln!("Grade scale config errors:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            std::process::exit(EXIT_CONFIG);
        }
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    debug!(bands = scale.bands().len(), "loaded grade scale");

    let book_path = match config.gradebook_path.clone() {
        Some(path) => path,
        None => match get_gradebook_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
    };

    let code = match run(cli.command, &cli.actor, &scale, &book_path) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p,
        None => config::get_config_path()?,
    };
    config::write_starter_config(&path, force)
}

/// Map an error chain to a process exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<GradebookError>() {
            return match e {
                GradebookError::Forbidden(_) => EXIT_FORBIDDEN,
                GradebookError::GradeNotFound { .. } | GradebookError::ReviewNotFound(_) => {
                    EXIT_NOT_FOUND
                }
                e if e.is_association() => EXIT_NOT_FOUND,
                _ => EXIT_VALIDATION,
            };
        }
        if cause.downcast_ref::<ScoringError>().is_some() {
            return EXIT_VALIDATION;
        }
        if cause.downcast_ref::<AccessDenied>().is_some() {
            return EXIT_FORBIDDEN;
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return EXIT_NOT_FOUND;
        }
    }
    EXIT_FAILURE
}

fn run(command: Commands, actor_args: &ActorArgs, scale: &GradeScale, book_path: &Path) -> Result<()> {
    let use_colors = output::should_use_colors();

    match command {
        Commands::Init { .. } => anyhow::bail!("init runs before the gradebook is loaded"),
        Commands::Classify { score } => {
            let score = Score::parse(&score)?;
            let result = classify_score(score, scale)?;
            println!(
                "{}",
                output::format_classification(score.value(), &result, use_colors)
            );
        }
        Commands::Scale => println!("{}", output::format_scale(scale)),
        Commands::Student(StudentCommand::List) => {
            let book = load_gradebook(book_path)?;
            for student in book.students() {
                println!("{:>4}  {}  <{}>", student.id, student.name, student.email);
            }
        }
        Commands::Student(StudentCommand::Courses { student_id }) => {
            let book = load_gradebook(book_path)?;
            for course in book.courses_for_student(student_id)? {
                println!("{:>4}  {:<8}  {}", course.id, course.code, course.name);
            }
        }
        Commands::Course(CourseCommand::Students { course_id }) => {
            let book = load_gradebook(book_path)?;
            for student in book.students_in_course(course_id)? {
                println!("{:>4}  {}  <{}>", student.id, student.name, student.email);
            }
        }
        Commands::Course(CourseCommand::List) => {
            let book = load_gradebook(book_path)?;
            for course in book.courses() {
                println!(
                    "{:>4}  {:<8}  {:>4}  {}",
                    course.id,
                    course.code,
                    output::format_credits(course.credit_units),
                    course.name
                );
            }
        }
        Commands::Transcript { student_id, json } => {
            let book = load_gradebook(book_path)?;
            let transcript = book.transcript(&actor_args.actor()?, student_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&transcript)?);
            } else {
                println!("{}", output::format_transcript(&transcript, use_colors));
            }
        }
        Commands::Gpa { student_id, json } => {
            let book = load_gradebook(book_path)?;
            let report = book.gpa_report(&actor_args.actor()?, student_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", output::format_gpa_report(&report));
            }
        }
        Commands::Review(ReviewCommand::List { course_id }) => {
            let book = load_gradebook(book_path)?;
            book.course(course_id)
                .ok_or(GradebookError::UnknownCourse(course_id))?;
            let reviews = book.reviews_for_course(course_id);
            println!(
                "{}",
                output::format_reviews(&reviews, book.average_rating(course_id))
            );
        }
        write => {
            let actor = actor_args.actor()?;
            let mut book = load_gradebook(book_path)?;
            let message = apply_write(&mut book, &actor, scale, write)?;
            save_gradebook(book_path, &book)?;
            info!(path = %book_path.display(), "saved gradebook");
            println!("{}", message);
        }
    }

    Ok(())
}

/// Apply one mutating command to the in-memory gradebook. Returns the line
/// to print once the gradebook has been saved.
fn apply_write(
    book: &mut Gradebook,
    actor: &Actor,
    scale: &GradeScale,
    command: Commands,
) -> Result<String> {
    let message = match command {
        Commands::Student(StudentCommand::Add { name, email }) => {
            let id = book.add_student(actor, &name, &email)?;
            format!("Added student #{}: {}", id, name)
        }
        Commands::Student(StudentCommand::Edit {
            student_id,
            name,
            email,
        }) => {
            book.update_student(actor, student_id, name.as_deref(), email.as_deref())?;
            format!("Updated student #{}", student_id)
        }
        Commands::Student(StudentCommand::Rm { student_id }) => {
            let removed = book.remove_student(actor, student_id)?;
            format!("Removed student #{}: {}", student_id, removed.name)
        }
        Commands::Student(StudentCommand::Enroll {
            student_id,
            course_id,
        }) => {
            book.enroll(actor, student_id, course_id)?;
            format!("Enrolled student #{} in course #{}", student_id, course_id)
        }
        Commands::Student(StudentCommand::Unenroll {
            student_id,
            course_id,
        }) => {
            book.unenroll(actor, student_id, course_id)?;
            format!("Unenrolled student #{} from course #{}", student_id, course_id)
        }
        Commands::Course(CourseCommand::Edit {
            course_id,
            code,
            name,
            lecturer,
        }) => {
            book.update_course(actor, course_id, code.as_deref(), name.as_deref(), lecturer)?;
            format!("Updated course #{}", course_id)
        }
        Commands::Course(CourseCommand::Rm { course_id }) => {
            let removed = book.remove_course(actor, course_id)?;
            format!("Removed course #{}: {}", course_id, removed.code)
        }
        Commands::Course(CourseCommand::Add {
            code,
            name,
            credits,
            lecturer,
        }) => {
            let id = book.add_course(actor, &code, &name, credits, lecturer)?;
            format!(
                "Added course #{}: {} ({} credits)",
                id,
                code,
                output::format_credits(credits)
            )
        }
        Commands::Course(CourseCommand::Credits { course_id, credits }) => {
            book.set_course_credits(actor, course_id, credits)?;
            format!(
                "Course #{} now carries {} credits",
                course_id,
                output::format_credits(credits)
            )
        }
        Commands::Grade(GradeCommand::Set {
            student_id,
            course_id,
            term,
            score,
            letter,
        }) => {
            let score = score.as_deref().map(Score::parse).transpose()?;
            let value = GradeValue::from_parts(score, letter)?;
            let submission = GradeSubmission {
                student_id,
                course_id,
                term,
                value,
            };
            let outcome = book.submit_grade(actor, scale, &submission)?;
            let verb = match outcome {
                SubmitOutcome::Created => "Recorded",
                SubmitOutcome::Updated => "Replaced",
            };
            format!(
                "{} grade for student #{} in course #{} ({})",
                verb, student_id, course_id, submission.term
            )
        }
        Commands::Grade(GradeCommand::Rm {
            student_id,
            course_id,
            term,
        }) => {
            let removed = book.remove_grade(actor, student_id, course_id, &term)?;
            format!(
                "Removed grade {} for student #{} in course #{} ({})",
                removed.letter, student_id, course_id, removed.term
            )
        }
        Commands::Grade(GradeCommand::Batch { file }) => {
            let submissions = read_batch(&file)?;
            let outcomes = book.submit_batch(actor, scale, &submissions)?;
            let created = outcomes
                .iter()
                .filter(|o| **o == SubmitOutcome::Created)
                .count();
            format!(
                "Applied {} grades ({} new, {} replaced)",
                outcomes.len(),
                created,
                outcomes.len() - created
            )
        }
        Commands::Review(ReviewCommand::Add {
            course_id,
            rating,
            comment,
        }) => {
            let id = book.add_review(actor, course_id, rating, &comment)?;
            format!("Added review #{} for course #{}", id, course_id)
        }
        Commands::Review(ReviewCommand::Edit {
            review_id,
            rating,
            comment,
        }) => {
            book.update_review(actor, review_id, rating, &comment)?;
            format!("Updated review #{}", review_id)
        }
        Commands::Review(ReviewCommand::Rm { review_id }) => {
            book.remove_review(actor, review_id)?;
            format!("Removed review #{}", review_id)
        }
        other => anyhow::bail!("{:?} does not modify the gradebook", other),
    };
    Ok(message)
}

/// Read a YAML list of grade submissions:
///
/// ```yaml
/// - { student_id: 1, course_id: 2, term: "2024-1", score: 85 }
/// - { student_id: 1, course_id: 3, term: "2024-1", letter: B }
/// ```
fn read_batch(path: &Path) -> Result<Vec<GradeSubmission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grade batch at {}", path.display()))?;
    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse grade batch in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_grade_set() {
        let cli = Cli::try_parse_from([
            "gradebook", "grade", "set", "1", "2", "2024-1", "--score", "85",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Grade(GradeCommand::Set { score: Some(_), letter: None, .. })
        ));
        assert_eq!(cli.actor.role, None);
        assert!(cli.actor.actor().is_err());
    }

    #[test]
    fn test_cli_rejects_score_and_letter_together() {
        let result = Cli::try_parse_from([
            "gradebook", "grade", "set", "1", "2", "2024-1", "--score", "85", "--letter", "B",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbosity_count() {
        let cli = Cli::try_parse_from(["gradebook", "-vv", "scale"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_student_actor_requires_id() {
        let cli = Cli::try_parse_from(["gradebook", "--as", "student", "review", "rm", "1"])
            .unwrap();
        assert!(cli.actor.actor().is_err());

        let cli = Cli::try_parse_from([
            "gradebook", "--as", "student", "--student-id", "4", "review", "rm", "1",
        ])
        .unwrap();
        assert_eq!(cli.actor.actor().unwrap(), Actor::student(4));
    }

    #[test]
    fn test_exit_codes() {
        let forbidden: anyhow::Error = GradebookError::Forbidden(AccessDenied {
            role: Role::Student,
            action: gradebook::access::Action::WriteGrades,
        })
        .into();
        assert_eq!(exit_code_for(&forbidden), EXIT_FORBIDDEN);

        let missing: anyhow::Error = GradebookError::UnknownStudent(9).into();
        assert_eq!(exit_code_for(&missing), EXIT_NOT_FOUND);

        let invalid: anyhow::Error =
            GradebookError::from(ScoringError::OutOfRange { score: 101.0 }).into();
        assert_eq!(exit_code_for(&invalid), EXIT_VALIDATION);

        let other = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&other), EXIT_FAILURE);
    }

    #[test]
    fn test_write_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradebook.json");
        let scale = GradeScale::default();
        let admin = ActorArgs {
            role: Some(Role::Admin),
            acting_student: None,
        };

        let add = |command| run(command, &admin, &scale, &path);
        add(Commands::Student(StudentCommand::Add {
            name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
        }))
        .unwrap();
        add(Commands::Course(CourseCommand::Add {
            code: "PHY101".to_string(),
            name: "General Physics".to_string(),
            credits: 3.0,
            lecturer: None,
        }))
        .unwrap();
        add(Commands::Grade(GradeCommand::Set {
            student_id: 1,
            course_id: 1,
            term: "2024-1".to_string(),
            score: Some("84".to_string()),
            letter: None,
        }))
        .unwrap();

        let book = load_gradebook(&path).unwrap();
        assert_eq!(book.grades().len(), 1);
        assert_eq!(book.cgpa(&Actor::admin(), 1).unwrap(), 3.0);

        // Another student cannot read this transcript
        let intruder = ActorArgs {
            role: Some(Role::Student),
            acting_student: Some(2),
        };
        let err = run(
            Commands::Transcript {
                student_id: 1,
                json: false,
            },
            &intruder,
            &scale,
            &path,
        )
        .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_FORBIDDEN);

        // Reads need a role too
        let anonymous = ActorArgs {
            role: None,
            acting_student: None,
        };
        let gpa = Commands::Gpa {
            student_id: 1,
            json: true,
        };
        assert!(run(gpa, &anonymous, &scale, &path).is_err());
    }

    #[test]
    fn test_read_batch_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.yaml");
        std::fs::write(
            &path,
            "- { student_id: 1, course_id: 2, term: \"2024-1\", score: 85 }\n\
             - { student_id: 1, course_id: 3, term: \"2024-1\", letter: B }\n",
        )
        .unwrap();

        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].value, GradeValue::Score(Score::new(85.0).unwrap()));
        assert_eq!(batch[1].value, GradeValue::Letter("B".to_string()));
    }

    #[test]
    fn test_read_batch_rejects_score_and_letter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.yaml");
        std::fs::write(
            &path,
            "- { student_id: 1, course_id: 2, term: \"2024-1\", score: 30, letter: A }\n",
        )
        .unwrap();

        let err = read_batch(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("both a score and a letter"));
    }

    #[test]
    fn test_enrollment_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradebook.json");
        let scale = GradeScale::default();
        let admin = ActorArgs {
            role: Some(Role::Admin),
            acting_student: None,
        };
        let student = ActorArgs {
            role: Some(Role::Student),
            acting_student: Some(1),
        };

        run(
            Commands::Student(StudentCommand::Add {
                name: "Ada Obi".to_string(),
                email: "ada@example.com".to_string(),
            }),
            &admin,
            &scale,
            &path,
        )
        .unwrap();
        run(
            Commands::Course(CourseCommand::Add {
                code: "PHY101".to_string(),
                name: "General Physics".to_string(),
                credits: 3.0,
                lecturer: None,
            }),
            &admin,
            &scale,
            &path,
        )
        .unwrap();

        let enroll = || {
            Commands::Student(StudentCommand::Enroll {
                student_id: 1,
                course_id: 1,
            })
        };
        run(enroll(), &student, &scale, &path).unwrap();
        let err = run(enroll(), &student, &scale, &path).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_VALIDATION);

        let book = load_gradebook(&path).unwrap();
        assert!(book.is_enrolled(1, 1));

        // Students cannot remove courses
        let err = run(
            Commands::Course(CourseCommand::Rm { course_id: 1 }),
            &student,
            &scale,
            &path,
        )
        .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_FORBIDDEN);

        run(
            Commands::Course(CourseCommand::Rm { course_id: 1 }),
            &admin,
            &scale,
            &path,
        )
        .unwrap();
        let book = load_gradebook(&path).unwrap();
        assert!(book.course(1).is_none());
        assert!(!book.is_enrolled(1, 1));
    }
}
