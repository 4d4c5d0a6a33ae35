//! Filesystem helpers used by the generators.
//!
//! These are the only places the pipeline touches the disk. They return raw
//! `io::Result`s so callers can put the underlying error text into their own
//! diagnostics.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create `path` and any missing parents
pub async fn ensure_directory(path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path).await
}

/// Write `contents` to `path` atomically.
///
/// The text goes to a sibling temporary file first and is renamed over the
/// target, so a failed write never leaves a truncated artifact behind.
pub async fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    let temp = temp_sibling(path)?;
    if let Err(err) = tokio::fs::write(&temp, contents).await {
        discard(&temp).await;
        return Err(err);
    }
    if let Err(err) = tokio::fs::rename(&temp, path).await {
        discard(&temp).await;
        return Err(err);
    }
    Ok(())
}

/// Best-effort removal of a leftover temporary file
async fn discard(temp: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp).await {
        tracing::debug!("failed to remove {}: {e}", temp.display());
    }
}

fn temp_sibling(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )
    })?;
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut temp_name = OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(format!(".{}.{counter}.tmp", std::process::id()));
    Ok(path.with_file_name(temp_name))
}

/// Names of the entries in `path`, in lexical order.
///
/// The OS gives no ordering guarantee for directory listings; sorting here is
/// what makes manifest order reproducible.
pub async fn read_directory_entries(path: &Path) -> io::Result<Vec<OsString>> {
    let mut reader = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

/// Whether anything exists at `path`
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Whether `path` is a directory (following symlinks)
pub async fn is_directory(path: &Path) -> io::Result<bool> {
    Ok(tokio::fs::metadata(path).await?.is_dir())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn test_write_file_replaces_contents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index.ts");

        write_file(&target, "first\n").await.unwrap();
        write_file(&target, "second\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second\n");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![OsString::from("index.ts")]);
    }

    #[tokio::test]
    async fn test_write_file_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("index.ts");

        assert!(write_file(&target, "x").await.is_err());
        assert!(!exists(&target).await);
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index.ts");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "").unwrap();

        assert!(write_file(&target, "x").await.is_err());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![OsString::from("index.ts")]);
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn test_discard_missing_temp_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        discard(&dir.path().join("never-written.tmp")).await;
    }

    #[tokio::test]
    async fn test_read_directory_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta.ts", "alpha.ts", "Beta.ts", "mid"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let names = read_directory_entries(dir.path()).await.unwrap();
        assert_eq!(
            names,
            vec![
                OsString::from("Beta.ts"),
                OsString::from("alpha.ts"),
                OsString::from("mid"),
                OsString::from("zeta.ts"),
            ]
        );
    }

    #[tokio::test]
    async fn test_ensure_directory_and_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory(&nested).await.unwrap();
        assert!(is_directory(&nested).await.unwrap());
        assert!(is_directory(&nested.join("nope")).await.is_err());
    }
}
