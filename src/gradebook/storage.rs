use super::book::{Gradebook, GRADEBOOK_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Get the default gradebook file path (~/.config/gradebook/gradebook.json)
pub fn get_gradebook_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("gradebook.json"))
}

/// Load a gradebook from a JSON file
///
/// If the file doesn't exist, returns a new empty gradebook.
/// If the file exists but has an unsupported version, or breaks a record
/// invariant (duplicate grade, dangling reference), returns an error.
pub fn load_gradebook(path: &Path) -> Result<Gradebook> {
    if !path.exists() {
        return Ok(Gradebook::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open gradebook file at {}", path.display()))?;

    let book: Gradebook = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load gradebook from {}", path.display()))?;

    if book.version() != GRADEBOOK_VERSION {
        anyhow::bail!("Unsupported gradebook version: {}", book.version());
    }

    let errors = book.integrity_errors();
    if !errors.is_empty() {
        anyhow::bail!(
            "Corrupt gradebook at {}: {}",
            path.display(),
            errors.join("; ")
        );
    }

    Ok(book)
}

/// Save a gradebook to a JSON file atomically
///
/// The file is never left half-written: either the old or the new contents
/// survive. Creates the parent directory if it doesn't exist.
pub fn save_gradebook(path: &Path, book: &Gradebook) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, book).context("Failed to serialize gradebook")?;

    file.commit().context("Failed to save gradebook")?;

    Ok(())
}
