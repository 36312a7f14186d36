//! Writing generated code next to its source.
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::Error;

/// `models/post.rs` → `models/post_rqlgen.rs`.
pub fn output_path(source: &Path) -> PathBuf {
    let stem = source.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    source.with_file_name(format!("{stem}_rqlgen.rs"))
}

pub fn write_output(path: &Path, text: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| Error::Write { path: path.to_path_buf(), source })?;
    }
    std::fs::write(path, text).map_err(|source| Error::Write { path: path.to_path_buf(), source })
}

/// Best-effort `rustfmt` pass. The unformatted file stays valid, so failures
/// are only logged.
pub fn format_file(path: &Path) {
    match Command::new("rustfmt").arg("--edition").arg("2024").arg(path).status() {
        Ok(status) if status.success() => debug!(path = %path.display(), "formatted"),
        Ok(status) => warn!(path = %path.display(), %status, "rustfmt failed, output left unformatted"),
        Err(error) => warn!(%error, "rustfmt unavailable, output left unformatted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_sits_beside_the_source() {
        assert_eq!(output_path(Path::new("models/post.rs")), PathBuf::from("models/post_rqlgen.rs"));
        assert_eq!(output_path(Path::new("post.rs")), PathBuf::from("post_rqlgen.rs"));
        assert_eq!(output_path(Path::new("a/b.model.rs")), PathBuf::from("a/b.model_rqlgen.rs"));
    }

    #[test]
    fn writing_into_a_directory_fails_with_write() {
        let dir = std::env::temp_dir().join(format!("rqlgen-emit-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let err = write_output(&dir, "x").unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(err.exit_code(), 3);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
