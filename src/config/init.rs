use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::schema::Config;

const HEADER: &str = "\
# gradebook configuration
#
# scale: grade bands, checked from the highest min_score down. The lowest
#        band must start at 0 and no two bands may share a min_score.
# gradebook_path: where grades are stored (default: next to this file)
";

/// Write the starter config (default A-F scale) to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set. Returns the
/// path written.
pub fn write_starter_config(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
    }

    let yaml = serde_saphyr::to_string(&Config::starter()).context("Failed to serialize config")?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(HEADER.as_bytes())
        .and_then(|_| file.write_all(yaml.as_bytes()))
        .context("Failed to write config")?;
    file.commit().context("Failed to save config")?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use crate::grading::GradeScale;

    #[test]
    fn test_written_config_loads_default_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradebook").join("config.yaml");

        write_starter_config(&path, false).unwrap();
        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.grade_scale().unwrap(), GradeScale::default());
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "{}").unwrap();

        assert!(write_starter_config(&path, false).is_err());
        assert!(write_starter_config(&path, true).is_ok());
        assert!(std::fs::read_to_string(&path).unwrap().contains("min_score"));
    }
}
