//! Relative path computation for embedded hyperlinks.
//!
//! Both the renderer (diagram-to-apidoc cross references) and the page
//! postprocessor (page-to-diagram references) embed links as forward-slash
//! relative paths, independent of the host's path separator.

use std::path::{Component, Path, PathBuf};

/// Errors from [`relativize`].
#[derive(Debug, thiserror::Error)]
pub enum RelativizeError {
    /// The `from` location is neither an existing file nor an existing
    /// directory; callers must hand in a real location to link from.
    #[error("not an existing file or directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Canonicalization failed.
    #[error("cannot canonicalize {}: {source}", .path.display())]
    Canonicalize {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Compute the relative path from one filesystem location to another,
/// joined with forward slashes.
///
/// `from` may be a file (its containing directory is used) or a directory;
/// it must exist. `to` does not have to exist yet: an existing `to` is
/// fully canonicalized, a not-yet-written one is cleaned lexically after
/// being anchored to an absolute base.
///
/// Identical directories yield just the remaining `to` segments, e.g.
/// `relativize(dir, dir/file.html)` is `"file.html"`.
pub fn relativize(from: &Path, to: &Path) -> Result<String, RelativizeError> {
    let from_dir = if from.is_file() {
        from.parent().unwrap_or(Path::new(""))
    } else if from.is_dir() {
        from
    } else {
        return Err(RelativizeError::NotADirectory(from.to_path_buf()));
    };

    let from_canonical =
        std::fs::canonicalize(from_dir).map_err(|source| RelativizeError::Canonicalize {
            path: from_dir.to_path_buf(),
            source,
        })?;
    let to_canonical = canonicalize_lenient(to)?;

    let from_parts: Vec<Component<'_>> = from_canonical.components().collect();
    let to_parts: Vec<Component<'_>> = to_canonical.components().collect();

    // Skip the common base path.
    let mut skip = 0;
    while skip < from_parts.len() && skip < to_parts.len() && from_parts[skip] == to_parts[skip] {
        skip += 1;
    }

    // One ".." per remaining 'from' directory, then the remaining 'to'
    // segments in order.
    let mut segments: Vec<String> = Vec::with_capacity(from_parts.len() + to_parts.len() - 2 * skip);
    for _ in skip..from_parts.len() {
        segments.push("..".to_owned());
    }
    for part in &to_parts[skip..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }
    Ok(segments.join("/"))
}

/// Canonicalize a location that may not exist yet.
///
/// The deepest existing ancestor is canonicalized through the filesystem
/// (resolving symlinks); the not-yet-existing remainder is appended and
/// cleaned lexically.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf, RelativizeError> {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return Ok(canonical);
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| RelativizeError::Canonicalize {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };

    let mut existing = absolute.as_path();
    while !existing.exists() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => break,
        }
    }
    let mut cleaned = std::fs::canonicalize(existing).unwrap_or_else(|_| existing.to_path_buf());
    let remainder = absolute.strip_prefix(existing).unwrap_or(&absolute);
    for component in remainder.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    Ok(cleaned)
}
