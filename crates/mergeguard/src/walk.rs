//! File discovery.
//!
//! Expands the paths given on the command line into the list of files to
//! scan. Directories are walked recursively; files named explicitly are
//! always included.

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::error::{Error, Result};

/// Walks input paths and yields the files to scan.
#[derive(Debug, Clone)]
pub struct FileWalker {
    excludes: Vec<Pattern>,
    extensions: Vec<String>,
    include_hidden: bool,
    follow_symlinks: bool,
}

impl FileWalker {
    /// Create a walker from scan configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern is not a valid glob.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let excludes = config
            .exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| Error::InvalidGlob {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let extensions = config
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Ok(Self {
            excludes,
            extensions,
            include_hidden: config.include_hidden,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Expand `paths` into a sorted, de-duplicated list of files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathNotFound`] if an input path does not exist, or a
    /// walk error if an input directory cannot be read.
    pub fn collect(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in paths {
            if !path.exists() {
                return Err(Error::PathNotFound { path: path.clone() });
            }
            if path.is_file() {
                files.push(path.clone());
                continue;
            }
            self.walk_dir(path, &mut files)?;
        }

        files.sort();
        files.dedup();
        debug!(count = files.len(), "files collected");
        Ok(files)
    }

    fn walk_dir(&self, root: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let walker = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_skipped(root, entry));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Walk error: {e}");
                    continue;
                }
            };

            if entry.file_type().is_file() && self.extension_allowed(entry.path()) {
                trace!(path = %entry.path().display(), "file found");
                files.push(entry.into_path());
            }
        }
        Ok(())
    }

    fn is_skipped(&self, root: &Path, entry: &DirEntry) -> bool {
        if !self.include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            return true;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        self.is_excluded(relative)
    }

    /// Check a path (relative to the walk root) against the exclude patterns.
    #[must_use]
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.excludes.iter().any(|pattern| {
            pattern.matches_path(relative)
                || relative
                    .components()
                    .any(|c| pattern.matches(&c.as_os_str().to_string_lossy()))
        })
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        create_test_file(dir.path(), "doc/supported.rst", "Cameras\n");
        create_test_file(dir.path(), "doc/index.md", "# Index\n");
        create_test_file(dir.path(), "src/lib.rs", "fn main() {}\n");
        create_test_file(dir.path(), ".hidden/notes.txt", "x\n");
        create_test_file(dir.path(), "target/debug/out.txt", "x\n");
        create_test_file(dir.path(), ".gitignore", "target\n");
        dir
    }

    #[test]
    fn test_collect_default_excludes() {
        let dir = fixture();
        let walker = FileWalker::new(&ScanConfig::default()).unwrap();
        let files = walker.collect(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            names(dir.path(), &files),
            vec!["doc/index.md", "doc/supported.rst", "src/lib.rs"]
        );
    }

    #[test]
    fn test_collect_include_hidden() {
        let dir = fixture();
        let config = ScanConfig {
            include_hidden: true,
            ..ScanConfig::default()
        };
        let walker = FileWalker::new(&config).unwrap();
        let files = walker.collect(&[dir.path().to_path_buf()]).unwrap();
        let names = names(dir.path(), &files);

        assert!(names.contains(&".gitignore".to_string()));
        assert!(names.contains(&".hidden/notes.txt".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("target")));
    }

    #[test]
    fn test_collect_extension_filter() {
        let dir = fixture();
        let config = ScanConfig {
            extensions: vec![".RST".to_string(), "md".to_string()],
            ..ScanConfig::default()
        };
        let walker = FileWalker::new(&config).unwrap();
        let files = walker.collect(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            names(dir.path(), &files),
            vec!["doc/index.md", "doc/supported.rst"]
        );
    }

    #[test]
    fn test_collect_custom_exclude_glob() {
        let dir = fixture();
        let mut config = ScanConfig::default();
        config.exclude.push("*.md".to_string());
        let walker = FileWalker::new(&config).unwrap();
        let files = walker.collect(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            names(dir.path(), &files),
            vec!["doc/supported.rst", "src/lib.rs"]
        );
    }

    #[test]
    fn test_explicit_file_bypasses_excludes() {
        let dir = fixture();
        let file = dir.path().join("target/debug/out.txt");
        let walker = FileWalker::new(&ScanConfig::default()).unwrap();
        let files = walker.collect(&[file.clone(), file.clone()]).unwrap();

        assert_eq!(files, vec![file]);
    }

    #[cfg(unix)]
    #[test]
    fn test_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        create_test_file(dir.path(), "doc/supported.rst", "Cameras\n");
        std::os::unix::fs::symlink(dir.path().join("doc"), dir.path().join("linked")).unwrap();

        let walker = FileWalker::new(&ScanConfig::default()).unwrap();
        let files = walker.collect(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["doc/supported.rst"]);

        let config = ScanConfig {
            follow_symlinks: true,
            ..ScanConfig::default()
        };
        let walker = FileWalker::new(&config).unwrap();
        let files = walker.collect(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            names(dir.path(), &files),
            vec!["doc/supported.rst", "linked/supported.rst"]
        );
    }

    #[test]
    fn test_missing_path() {
        let walker = FileWalker::new(&ScanConfig::default()).unwrap();
        let err = walker
            .collect(&[PathBuf::from("/nonexistent/docs")])
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_is_excluded() {
        let walker = FileWalker::new(&ScanConfig::default()).unwrap();
        assert!(walker.is_excluded(Path::new("target/debug/build.log")));
        assert!(walker.is_excluded(Path::new("web/node_modules/x/index.js")));
        assert!(!walker.is_excluded(Path::new("doc/supported.rst")));
    }

    #[test]
    fn test_invalid_glob() {
        let config = ScanConfig {
            exclude: vec!["[".to_string()],
            ..ScanConfig::default()
        };
        assert!(matches!(
            FileWalker::new(&config).unwrap_err(),
            Error::InvalidGlob { .. }
        ));
    }
}
