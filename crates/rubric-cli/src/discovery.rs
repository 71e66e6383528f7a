//! Finding the Ruby files to lint
//!
//! Directories are walked and filtered through the configured include and
//! exclude globs, matched against the path relative to the walked directory.
//! Files named explicitly are always linted. Arguments that do not exist are
//! expanded as glob patterns.

use anyhow::{Context, Result, bail};
use glob::Pattern;
use rubric_core::RubricConfig;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Compiled include/exclude globs
pub struct FileFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileFilter {
    pub fn from_config(config: &RubricConfig) -> Result<Self> {
        Ok(Self {
            include: compile(&config.include_patterns(), "include")?,
            exclude: compile(&config.exclude_patterns(), "exclude")?,
        })
    }

    /// Whether `relative` (a path below a walked directory) should be linted
    pub fn accepts(&self, relative: &Path) -> bool {
        let matches = |patterns: &[Pattern]| patterns.iter().any(|p| p.matches_path(relative));
        matches(&self.include) && !matches(&self.exclude)
    }

    fn excludes(&self, relative: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(relative))
    }
}

fn compile(patterns: &[String], kind: &str) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid {kind} pattern '{p}'")))
        .collect()
}

/// Files to lint for the given command-line paths, sorted and deduplicated
pub fn discover_files(paths: &[PathBuf], filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for path in paths {
        if path.is_file() {
            files.insert(path.clone());
        } else if path.is_dir() {
            files.extend(walk(path, filter));
        } else {
            let pattern = path.to_string_lossy();
            let entries = glob::glob(&pattern)
                .with_context(|| format!("Invalid path pattern '{pattern}'"))?;
            let mut found = false;
            for entry in entries {
                match entry {
                    Ok(p) if p.is_file() => {
                        files.insert(p);
                        found = true;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Glob entry error: {}", e),
                }
            }
            if !found {
                bail!("Path does not exist: {}", path.display());
            }
        }
    }

    debug!("Discovered {} Ruby files", files.len());
    Ok(files.into_iter().collect())
}

fn walk(root: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            // prune excluded directories instead of walking into them
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !filter.excludes(relative_to(root, entry.path()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = relative_to(root, entry.path());
        if filter.accepts(relative) {
            files.push(display_path(root, entry.path()));
        }
    }
    files
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// `./lib/a.rb` is shown as `lib/a.rb`
fn display_path(root: &Path, path: &Path) -> PathBuf {
    if root == Path::new(".") {
        relative_to(root, path).to_path_buf()
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("lib/nested")).unwrap();
        fs::create_dir_all(root.join("vendor/gems")).unwrap();
        fs::write(root.join("app.rb"), "puts 1\n").unwrap();
        fs::write(root.join("lib/nested/tool.rb"), "puts 2\n").unwrap();
        fs::write(root.join("lib/tasks.rake"), "puts 3\n").unwrap();
        fs::write(root.join("Gemfile"), "gem \"rake\"\n").unwrap();
        fs::write(root.join("vendor/gems/dep.rb"), "puts 4\n").unwrap();
        fs::write(root.join("README.md"), "# readme\n").unwrap();
        temp_dir
    }

    fn relative_names(root: &Path, files: &[PathBuf]) -> Vec<String> {
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

    #[test]
    fn test_default_patterns() {
        let temp_dir = create_project();
        let filter = FileFilter::from_config(&RubricConfig::default()).unwrap();
        let files = discover_files(&[temp_dir.path().to_path_buf()], &filter).unwrap();
        assert_eq!(
            relative_names(temp_dir.path(), &files),
            [
                "Gemfile",
                "app.rb",
                "lib/nested/tool.rb",
                "lib/tasks.rake",
                "vendor/gems/dep.rb"
            ]
        );
    }

    #[test]
    fn test_exclude_prunes_directories() {
        let temp_dir = create_project();
        let config = RubricConfig::from_toml(
            r#"
            [files]
            exclude = ["vendor/**", "lib/nested"]
            "#,
        )
        .unwrap();
        let filter = FileFilter::from_config(&config).unwrap();
        let files = discover_files(&[temp_dir.path().to_path_buf()], &filter).unwrap();
        assert_eq!(
            relative_names(temp_dir.path(), &files),
            ["Gemfile", "app.rb", "lib/tasks.rake"]
        );
    }

    #[test]
    fn test_explicit_file_is_always_linted() {
        let temp_dir = create_project();
        let readme = temp_dir.path().join("README.md");
        let filter = FileFilter::from_config(&RubricConfig::default()).unwrap();
        let files = discover_files(std::slice::from_ref(&readme), &filter).unwrap();
        assert_eq!(files, [readme]);
    }

    #[test]
    fn test_glob_argument() {
        let temp_dir = create_project();
        let pattern = temp_dir.path().join("lib/**/*.rb");
        let filter = FileFilter::from_config(&RubricConfig::default()).unwrap();
        let files = discover_files(&[pattern], &filter).unwrap();
        assert_eq!(relative_names(temp_dir.path(), &files), ["lib/nested/tool.rb"]);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let temp_dir = create_project();
        let filter = FileFilter::from_config(&RubricConfig::default()).unwrap();
        let err = discover_files(&[temp_dir.path().join("missing.rb")], &filter).unwrap_err();
        assert!(err.to_string().contains("Path does not exist"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let config = RubricConfig::from_toml("[files]\ninclude = [\"[\"]\n").unwrap();
        assert!(FileFilter::from_config(&config).is_err());
    }
}
