use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::grading::{default_bands, GradeBand, GradeScale, ScoringError};

/// Contents of `config.yaml`.
///
/// Example YAML:
/// ```yaml
/// gradebook_path: /srv/records/gradebook.json
/// scale:
///   - { min_score: 70, letter: A, points: 5.0 }
///   - { min_score: 60, letter: B, points: 4.0 }
///   - { min_score: 50, letter: C, points: 3.0 }
///   - { min_score: 45, letter: D, points: 2.0 }
///   - { min_score: 40, letter: E, points: 1.0 }
///   - { min_score: 0, letter: F, points: 0.0 }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Grade bands; the standard A-F scale when absent
    #[serde(default)]
    pub scale: Option<Vec<GradeBand>>,

    /// Where the gradebook JSON lives (default: ~/.config/gradebook/gradebook.json)
    #[serde(default)]
    pub gradebook_path: Option<PathBuf>,
}

impl Config {
    /// Config written by `gradebook init`: the default scale spelled out so
    /// it can be edited in place.
    pub fn starter() -> Self {
        Self {
            scale: Some(default_bands()),
            gradebook_path: None,
        }
    }

    pub fn grade_scale(&self) -> Result<GradeScale, ScoringError> {
        match &self.scale {
            Some(bands) => GradeScale::new(bands.clone()),
            None => Ok(GradeScale::default()),
        }
    }
}
