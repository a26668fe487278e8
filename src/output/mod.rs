pub mod formatter;

pub use formatter::{
    format_classification, format_credits, format_gpa, format_gpa_report, format_reviews,
    format_scale, format_transcript, should_use_colors,
};
