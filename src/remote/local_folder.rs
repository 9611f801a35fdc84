use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::filesystem::split_path;
use crate::remote::remote::{IoSnafu, PathSnafu, Remote, RemoteError, Utf8Snafu};

/// Serves the files below a directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFolder {
    root: PathBuf,
    exclude: Vec<String>,
}

impl LocalFolder {
    /// `exclude` holds names hidden from [`Remote::list`] wherever they appear in a path.
    pub fn new(root: impl Into<PathBuf>, exclude: Vec<String>) -> Self {
        Self {
            root: root.into(),
            exclude,
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, RemoteError> {
        let segments = split_path(path).context(PathSnafu)?;
        Ok(segments
            .into_iter()
            .fold(self.root.clone(), |full, segment| full.join(segment)))
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == name)
    }

    fn walk(&self, dir: &Path, prefix: &str, paths: &mut Vec<String>) -> Result<(), RemoteError> {
        let display = || dir.display().to_string();

        let mut entries = std::fs::read_dir(dir)
            .context(IoSnafu { path: display() })?
            .collect::<Result<Vec<_>, _>>()
            .context(IoSnafu { path: display() })?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    warn!("Skipping entry with non UTF-8 name {:?} in {}", name, dir.display());
                    continue;
                }
            };
            if self.is_excluded(&name) {
                debug!("Skipping excluded entry '{}'", name);
                continue;
            }

            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };

            let file_type = entry.file_type().context(IoSnafu {
                path: relative.clone(),
            })?;
            if file_type.is_dir() {
                self.walk(&entry.path(), &relative, paths)?;
            } else if file_type.is_file() {
                paths.push(relative);
            }
        }

        Ok(())
    }
}

fn io_error(path: &str, source: std::io::Error) -> RemoteError {
    if source.kind() == ErrorKind::NotFound {
        RemoteError::NotFoundError {
            path: path.to_string(),
        }
    } else {
        RemoteError::IoError {
            path: path.to_string(),
            source,
        }
    }
}

impl Remote for LocalFolder {
    async fn list(&self) -> Result<Vec<String>, RemoteError> {
        let mut paths = Vec::new();
        self.walk(&self.root, "", &mut paths)?;
        debug!("Listed {} files below {}", paths.len(), self.root.display());
        Ok(paths)
    }

    async fn get(&self, path: &str) -> Result<String, RemoteError> {
        let full = self.resolve(path)?;
        let bytes = fs::read(&full).await.map_err(|e| io_error(path, e))?;
        String::from_utf8(bytes).context(Utf8Snafu { path })
    }

    async fn set(&self, path: &str, content: &str) -> Result<(), RemoteError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(path, e))?;
        }

        fs::write(&full, content.as_bytes().to_vec())
            .await
            .0
            .map_err(|e| io_error(path, e))
    }

    async fn remove(&self, path: &str) -> Result<(), RemoteError> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).await.map_err(|e| io_error(path, e))
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), RemoteError> {
        let from = self.resolve(old_path)?;
        let to = self.resolve(new_path)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(new_path, e))?;
        }

        fs::rename(&from, &to)
            .await
            .map_err(|e| io_error(old_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    fn folder_with(files: &[(&str, &str)]) -> (TempDir, LocalFolder) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for (path, content) in files {
            let full = temp_dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).expect("Failed to create parent");
            std::fs::write(full, content).expect("Failed to write file");
        }
        let folder = LocalFolder::new(temp_dir.path(), vec![".remix.config".to_string()]);
        (temp_dir, folder)
    }

    #[compio::test]
    async fn list_returns_sorted_relative_paths() {
        let (_dir, folder) = folder_with(&[
            ("b.txt", "b"),
            ("a/y.sol", "y"),
            ("a/x/z.sol", "z"),
        ]);

        let paths = folder.list().await.expect("Failed to list");

        assert_eq!(paths, vec!["a/x/z.sol", "a/y.sol", "b.txt"]);
    }

    #[compio::test]
    async fn list_skips_excluded_names() {
        let (_dir, folder) = folder_with(&[
            (".remix.config", "{}"),
            ("nested/.remix.config/inner.txt", "hidden"),
            ("kept.txt", "kept"),
        ]);

        let paths = folder.list().await.expect("Failed to list");

        assert_eq!(paths, vec!["kept.txt"]);
    }

    #[cfg(target_os = "linux")]
    #[compio::test]
    async fn list_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, folder) = folder_with(&[("kept.txt", "kept")]);
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), "x")
            .expect("Failed to write file");

        let paths = folder.list().await.expect("Failed to list");

        assert_eq!(paths, vec!["kept.txt"]);
    }

    #[compio::test]
    async fn list_of_empty_folder_is_empty() {
        let (_dir, folder) = folder_with(&[]);
        assert!(folder.list().await.expect("Failed to list").is_empty());
    }

    #[compio::test]
    async fn get_reads_file_content() {
        let (_dir, folder) = folder_with(&[("contracts/Token.sol", "pragma solidity;")]);

        let content = folder.get("contracts/Token.sol").await;

        assert_eq!(content.unwrap(), "pragma solidity;");
    }

    #[compio::test]
    async fn get_missing_file_is_not_found() {
        let (_dir, folder) = folder_with(&[]);

        let result = folder.get("missing.txt").await;

        match result {
            Err(RemoteError::NotFoundError { path }) => assert_eq!(path, "missing.txt"),
            other => panic!("Expected NotFoundError, got {other:?}"),
        }
    }

    #[compio::test]
    async fn get_rejects_non_utf8_content() {
        let (dir, folder) = folder_with(&[]);
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00])
            .expect("Failed to write file");

        let result = folder.get("blob.bin").await;

        assert!(matches!(result, Err(RemoteError::Utf8Error { .. })));
    }

    #[rstest]
    #[case("../outside.txt")]
    #[case("/etc/passwd")]
    #[case("a//b")]
    #[compio::test]
    async fn paths_escaping_the_root_are_refused(#[case] path: &str) {
        let (_dir, folder) = folder_with(&[]);

        let result = folder.set(path, "x").await;

        assert!(matches!(result, Err(RemoteError::PathError { .. })));
    }

    #[compio::test]
    async fn set_creates_parent_directories() {
        let (dir, folder) = folder_with(&[]);

        folder
            .set("deep/nested/file.txt", "content")
            .await
            .expect("Failed to set");

        let written = std::fs::read_to_string(dir.path().join("deep/nested/file.txt"))
            .expect("Failed to read back");
        assert_eq!(written, "content");
    }

    #[compio::test]
    async fn set_overwrites_existing_file() {
        let (dir, folder) = folder_with(&[("a.txt", "old content that is longer")]);

        folder.set("a.txt", "new").await.expect("Failed to set");

        let written = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(written, "new");
    }

    #[compio::test]
    async fn remove_deletes_file() {
        let (dir, folder) = folder_with(&[("a.txt", "a")]);

        folder.remove("a.txt").await.expect("Failed to remove");

        assert!(!dir.path().join("a.txt").exists());
    }

    #[compio::test]
    async fn remove_missing_file_is_not_found() {
        let (_dir, folder) = folder_with(&[]);
        let result = folder.remove("missing.txt").await;
        assert!(matches!(result, Err(RemoteError::NotFoundError { .. })));
    }

    #[compio::test]
    async fn rename_moves_file_into_new_directory() {
        let (dir, folder) = folder_with(&[("a.txt", "a")]);

        folder
            .rename("a.txt", "moved/b.txt")
            .await
            .expect("Failed to rename");

        assert!(!dir.path().join("a.txt").exists());
        let moved = std::fs::read_to_string(dir.path().join("moved/b.txt")).unwrap();
        assert_eq!(moved, "a");
    }
}
