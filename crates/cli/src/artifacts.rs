//! Saving downloaded outputs to disk.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Write `bytes` to `dir/file_name`, creating `dir` if needed.
///
/// `file_name` comes from the server side naming scheme; anything that
/// looks like a path is reduced to its last component.
pub async fn save(dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let name = Path::new(file_name)
        .file_name()
        .with_context(|| format!("Invalid output file name: {file_name:?}"))?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Cannot create output directory {}", dir.display()))?;

    let path = dir.join(name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;

    tracing::info!(path = %path.display(), size = bytes.len(), "Output saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_into_a_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");

        let path = save(&dir, "transcriptions_42.zip", b"PK").await.unwrap();

        assert_eq!(path, dir.join("transcriptions_42.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK");
    }

    #[tokio::test]
    async fn path_components_are_stripped() {
        let tmp = tempfile::tempdir().unwrap();

        let path = save(tmp.path(), "../../etc/resume_42.txt", b"x").await.unwrap();

        assert_eq!(path, tmp.path().join("resume_42.txt"));
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(save(tmp.path(), "..", b"x").await.is_err());
    }
}
