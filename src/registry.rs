//! Access registry: which log files may be tailed.
//!
//! The registry walks every configured root recursively on each call. A path
//! is accessible only if it appears verbatim in that enumeration, so
//! `logs/../etc/passwd` is refused even when it resolves inside a root.

use crate::error::{Result, TailError};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Allow-list of log files derived from configured root directories
#[derive(Debug, Clone)]
pub struct AccessRegistry {
    roots: Vec<PathBuf>,
}

impl AccessRegistry {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Every regular file below the configured roots, including links to one
    pub fn list_accessible(&self) -> Result<BTreeSet<PathBuf>> {
        let mut files = BTreeSet::new();
        for root in &self.roots {
            let metadata = fs::metadata(root)
                .map_err(|e| TailError::invalid_location(root, e.to_string()))?;
            if !metadata.is_dir() {
                return Err(TailError::invalid_location(root, "not a directory"));
            }
            collect_files(root, &mut files)?;
        }
        log::trace!("access registry lists {} files", files.len());
        Ok(files)
    }

    /// Whether `path` is one of the listed files
    pub fn is_accessible(&self, path: &Path) -> Result<bool> {
        if path.as_os_str().is_empty() {
            return Ok(false);
        }
        Ok(self.list_accessible()?.contains(path))
    }

    /// Fail with [`TailError::AccessDenied`] unless `path` is accessible
    pub fn check(&self, path: &Path) -> Result<()> {
        if self.is_accessible(path)? {
            Ok(())
        } else {
            Err(TailError::access_denied(path))
        }
    }
}

fn collect_files(dir: &Path, files: &mut BTreeSet<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| TailError::invalid_location(dir, e.to_string()))?;

    for entry in entries {
        let entry = entry.map_err(|e| TailError::invalid_location(dir, e.to_string()))?;
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                log::debug!("skipping {}: {e}", path.display());
                continue;
            }
        };

        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if file_type.is_file() {
            files.insert(path);
        } else if file_type.is_symlink() {
            // listed under the link's own path; linked directories are not walked
            match fs::metadata(&path) {
                Ok(target) if target.is_file() => {
                    files.insert(path);
                }
                Ok(_) => {}
                Err(e) => log::debug!("skipping dangling link {}: {e}", path.display()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("dpkg.log"), "a\n").unwrap();
        fs::create_dir_all(dir.path().join("nginx/old")).unwrap();
        fs::write(dir.path().join("nginx/access.log"), "b\n").unwrap();
        fs::write(dir.path().join("nginx/old/access.log.1"), "c\n").unwrap();
        dir
    }

    #[test]
    fn test_lists_files_recursively() {
        let dir = create_tree();
        let registry = AccessRegistry::new([dir.path()]);

        let files = registry.list_accessible().unwrap();
        let expected: BTreeSet<PathBuf> = [
            dir.path().join("dpkg.log"),
            dir.path().join("nginx/access.log"),
            dir.path().join("nginx/old/access.log.1"),
        ]
        .into_iter()
        .collect();
        assert_eq!(files, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_listed() {
        use std::os::unix::fs::symlink;

        let dir = create_tree();
        let elsewhere = TempDir::new().expect("Failed to create temp directory");
        fs::write(elsewhere.path().join("real.log"), "d\n").unwrap();
        symlink(elsewhere.path().join("real.log"), dir.path().join("syslog")).unwrap();
        symlink(elsewhere.path(), dir.path().join("linked_dir")).unwrap();
        symlink(dir.path().join("gone.log"), dir.path().join("dangling")).unwrap();

        let registry = AccessRegistry::new([dir.path()]);
        let files = registry.list_accessible().unwrap();

        assert!(files.contains(&dir.path().join("syslog")));
        assert!(!files.contains(&dir.path().join("linked_dir/real.log")));
        assert!(!files.contains(&dir.path().join("dangling")));
        assert_eq!(files.len(), 4);
        assert!(registry.check(&dir.path().join("syslog")).is_ok());
    }

    #[test]
    fn test_membership() {
        let dir = create_tree();
        let registry = AccessRegistry::new([dir.path()]);

        assert!(registry.is_accessible(&dir.path().join("nginx/access.log")).unwrap());
        assert!(!registry.is_accessible(&dir.path().join("nginx")).unwrap());
        assert!(!registry.is_accessible(Path::new("/etc/passwd")).unwrap());
        assert!(!registry
            .is_accessible(&dir.path().join("nginx/../dpkg.log"))
            .unwrap());
        assert!(!registry.is_accessible(Path::new("")).unwrap());
    }

    #[test]
    fn test_check_maps_to_access_denied() {
        let dir = create_tree();
        let registry = AccessRegistry::new([dir.path()]);

        match registry.check(Path::new("/etc/shadow")) {
            Err(TailError::AccessDenied { path }) => assert_eq!(path, Path::new("/etc/shadow")),
            other => panic!("expected AccessDenied, got {other:?}"),
        }
        assert!(registry.check(&dir.path().join("dpkg.log")).is_ok());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let registry = AccessRegistry::new(["/this/directory/does/not/exist"]);
        assert!(matches!(
            registry.list_accessible(),
            Err(TailError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_file_root_is_an_error() {
        let dir = create_tree();
        let registry = AccessRegistry::new([dir.path().join("dpkg.log")]);
        match registry.list_accessible() {
            Err(TailError::InvalidLocation { message, .. }) => {
                assert_eq!(message, "not a directory");
            }
            other => panic!("expected InvalidLocation, got {other:?}"),
        }
    }
}
