//! Input and output plumbing shared by both pipelines.
//!
//! Inputs are read fully into memory before any transformation starts, and
//! outputs are written exactly once at the end through a temp file + rename,
//! so a failed run never leaves a half-written file behind.

use crate::error::MdPressError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a UTF-8 text file, mapping failures to precise error variants.
pub fn read_text(path: &Path) -> Result<String, MdPressError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MdPressError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => MdPressError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => MdPressError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|e| MdPressError::NotUtf8 {
        path: path.to_path_buf(),
        detail: e.utf8_error().to_string(),
    })?;

    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

/// The Markdown output path for an HTML input: same location and stem, `.md`.
pub fn markdown_output_path(input: &Path) -> PathBuf {
    input.with_extension("md")
}

/// Write `bytes` to `path` atomically: temp file in the same directory, then
/// rename over the destination.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MdPressError> {
    let write_err = |source: std::io::Error| MdPressError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            markdown_output_path(Path::new("docs/page.html")),
            PathBuf::from("docs/page.md")
        );
        assert_eq!(
            markdown_output_path(Path::new("export.htm")),
            PathBuf::from("export.md")
        );
        assert_eq!(markdown_output_path(Path::new("README")), PathBuf::from("README.md"));
    }

    #[test]
    fn read_missing_file() {
        let err = read_text(Path::new("/definitely/not/a/real/file.html")).unwrap_err();
        assert!(matches!(err, MdPressError::FileNotFound { .. }));
    }

    #[test]
    fn read_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.html");
        std::fs::write(&p, [0xffu8, 0xfe, 0x00]).unwrap();
        let err = read_text(&p).unwrap_err();
        assert!(matches!(err, MdPressError::NotUtf8 { .. }));
    }

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nested/out.md");
        write_atomic(&p, b"first").unwrap();
        write_atomic(&p, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&p).unwrap(), "second");
        // No stray temp files next to the output.
        let entries = std::fs::read_dir(p.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
