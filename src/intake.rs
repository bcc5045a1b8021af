//! File intake
//!
//! Persists an uploaded PDF under the working directory, keyed by its
//! original filename, and removes it again when the user discards it.
//! Filenames are reduced to their final path component so a hostile name
//! cannot escape the upload directory.

use crate::errors::AppError;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Sanitize an uploaded filename to a plain `.pdf` basename.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::InvalidFilename(filename.to_string()))?;

    // file_name() already strips directories; reject anything that still
    // smells like traversal or an empty basename.
    let has_odd_components = Path::new(name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if name.is_empty() || has_odd_components {
        return Err(AppError::InvalidFilename(filename.to_string()));
    }

    let is_pdf = Path::new(name)
        .extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(AppError::InvalidFilename(format!(
            "{}: only PDF files are accepted",
            filename
        )));
    }

    Ok(name.to_string())
}

/// Write uploaded bytes to `<upload_dir>/<filename>`, creating the
/// directory if absent. Returns the persisted path.
pub fn save_upload(upload_dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    let name = sanitize_filename(filename)?;
    std::fs::create_dir_all(upload_dir)?;

    let path = upload_dir.join(name);
    std::fs::write(&path, bytes)?;

    info!(path = %path.display(), size = bytes.len(), "Uploaded file saved");
    Ok(path)
}

/// Delete a persisted upload from disk.
pub fn delete_upload(path: &Path) -> Result<(), AppError> {
    std::fs::remove_file(path)?;
    info!(path = %path.display(), "Uploaded file removed");
    Ok(())
}
