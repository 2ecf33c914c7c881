//! Abstraction for a single generated documentation page.

use std::io::Write;
use std::path::{Path, PathBuf};

use umldoc_config::PageEncoding;

use crate::PostprocessError;

/// An already-produced documentation page on disk.
///
/// The page owns its location and encoding, never its content: content is
/// read and written per operation.
#[derive(Debug, Clone)]
pub struct GeneratedPage {
    path: PathBuf,
    encoding: PageEncoding,
}

impl GeneratedPage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, encoding: PageEncoding) -> Self {
        Self {
            path: path.into(),
            encoding,
        }
    }

    /// Whether a path denotes a readable generated page.
    #[must_use]
    pub fn is_page_file(path: &Path) -> bool {
        path.is_file()
            && path.extension().is_some_and(|ext| ext == "html")
            && std::fs::File::open(path).is_ok()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the page's full content as lines, in the configured encoding.
    ///
    /// # Errors
    ///
    /// Any read or decode failure is fatal for the whole run
    /// ([`PostprocessError::Read`]), not just for this page.
    pub fn read_lines(&self) -> Result<Vec<String>, PostprocessError> {
        let bytes = std::fs::read(&self.path).map_err(|e| PostprocessError::Read {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let text = self
            .encoding
            .decode(&bytes)
            .ok_or_else(|| PostprocessError::Read {
                path: self.path.clone(),
                reason: "content is not valid in the configured encoding".to_owned(),
            })?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    /// Write new content to a staging file and atomically replace this
    /// page with it.
    ///
    /// Postcondition on success: the page's path holds exactly the new
    /// content and no staging artifact remains, regardless of whether the
    /// rename or the copy fallback executed.
    ///
    /// # Errors
    ///
    /// Staging failures, failure to delete the original, and failure to
    /// delete the staging file after a copy fallback are all fatal.
    pub fn replace_content(&self, lines: &[String]) -> Result<(), PostprocessError> {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        let mut text = lines.join("\n");
        text.push('\n');
        let bytes = self.encoding.encode(&text);

        // Staging in the page's own directory keeps the rename on one
        // filesystem.
        let staging = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
            PostprocessError::Staging {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        let staging_path = write_staging(staging, &bytes).map_err(|e| PostprocessError::Staging {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;

        self.replace_by(&staging_path)
    }

    /// Delete the original and move the staging file into its place,
    /// falling back to copy-and-delete when the rename fails (e.g. across
    /// filesystems).
    fn replace_by(&self, staging_path: &Path) -> Result<(), PostprocessError> {
        std::fs::remove_file(&self.path).map_err(|e| PostprocessError::Delete {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if std::fs::rename(staging_path, &self.path).is_ok() {
            tracing::debug!(page = %self.path.display(), "Renamed staging file into place");
            return Ok(());
        }

        std::fs::copy(staging_path, &self.path).map_err(|e| PostprocessError::Staging {
            path: staging_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(page = %self.path.display(), "Copied staging file into place");
        std::fs::remove_file(staging_path).map_err(|e| PostprocessError::StagingLeak {
            path: staging_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Write the staging bytes and persist the file so it survives until the
/// replace step (and a crash before it).
fn write_staging(
    mut staging: tempfile::NamedTempFile,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    staging.write_all(bytes)?;
    staging.flush()?;
    let (file, path) = staging.keep().map_err(|e| e.error)?;
    drop(file);
    Ok(path)
}
