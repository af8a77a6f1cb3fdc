//! File discovery for multi-file search.
//!
//! Walks each root in the order given, visiting entries sorted by file name
//! so the resulting file order (and therefore "first N matches") is stable
//! across runs.

use crate::config::{ConfigError, ProjectConfig, ResolvedGlobs};
use crate::error::Error;
use crate::grammar::{GrammarRegistry, Language};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A file to search and the language it is parsed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
}

/// Language inference and ignore rules taken from the project config.
#[derive(Debug, Clone, Default)]
pub struct FileSelector {
    language_globs: Vec<(Language, Pattern)>,
    ignore: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl FileSelector {
    pub fn from_config(config: &ProjectConfig, registry: &GrammarRegistry) -> Result<Self, ConfigError> {
        let ResolvedGlobs { language_globs, ignore } = config
            .resolve(registry)
            .map_err(|source| ConfigError::Validation { path: None, source })?;
        Ok(Self {
            language_globs,
            ignore,
        })
    }

    /// Language of `relative` (a path below a search root): the first
    /// matching `languageGlobs` entry, else the file extension.
    pub fn language_for(&self, registry: &GrammarRegistry, relative: &Path) -> Option<Language> {
        let file_name = relative.file_name().map(Path::new);
        self.language_globs
            .iter()
            .find(|(_, pattern)| {
                pattern.matches_path_with(relative, MATCH_OPTIONS)
                    || file_name.is_some_and(|name| pattern.matches_path_with(name, MATCH_OPTIONS))
            })
            .map(|(language, _)| language.clone())
            .or_else(|| registry.language_for_path(relative))
    }

    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.ignore
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, MATCH_OPTIONS))
    }
}

/// Collects the files under `roots` that parse as a registered language,
/// restricted to `only` when given.
///
/// A root may be a single file. Hidden entries below a root are skipped.
pub fn discover(
    roots: &[PathBuf],
    registry: &GrammarRegistry,
    selector: &FileSelector,
    only: Option<&Language>,
) -> Result<Vec<SourceFile>, Error> {
    let mut files = Vec::new();

    for root in roots {
        if !root.exists() {
            return Err(Error::Io {
                path: root.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = match path.strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => path,
            };
            if selector.is_ignored(relative) {
                continue;
            }
            let Some(language) = selector.language_for(registry, relative) else {
                continue;
            };
            if only.is_some_and(|wanted| *wanted != language) {
                continue;
            }
            files.push(SourceFile {
                path: path.to_path_buf(),
                language,
            });
        }
    }

    debug!(roots = roots.len(), files = files.len(), "discovered files");
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("src/b.py"), "b = 1\n").unwrap();
        fs::write(dir.path().join("src/a.py"), "a = 1\n").unwrap();
        fs::write(dir.path().join("src/nested/c.rs"), "fn c() {}\n").unwrap();
        fs::write(dir.path().join("src/README"), "text\n").unwrap();
        fs::write(dir.path().join(".git/config.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("vendor/lib.py"), "v = 1\n").unwrap();
        dir
    }

    fn names(files: &[SourceFile], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.strip_prefix(root).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn walks_in_sorted_order_and_skips_hidden() {
        let dir = tree();
        let registry = GrammarRegistry::builtin();
        let files = discover(
            &[dir.path().to_path_buf()],
            &registry,
            &FileSelector::default(),
            None,
        )
        .unwrap();

        assert_eq!(
            names(&files, dir.path()),
            vec!["src/a.py", "src/b.py", "src/nested/c.rs", "vendor/lib.py"]
        );
    }

    #[test]
    fn filters_by_language_and_ignore_globs() {
        let dir = tree();
        let registry = GrammarRegistry::builtin();
        let config = ProjectConfig {
            ignore: vec!["vendor/**".into()],
            ..ProjectConfig::default()
        };
        let selector = FileSelector::from_config(&config, &registry).unwrap();
        let python = registry.resolve("python").unwrap();

        let files = discover(&[dir.path().to_path_buf()], &registry, &selector, Some(&python)).unwrap();
        assert_eq!(names(&files, dir.path()), vec!["src/a.py", "src/b.py"]);
    }

    #[test]
    fn language_globs_override_extensions() {
        let registry = GrammarRegistry::builtin();
        let mut config = ProjectConfig::default();
        config
            .language_globs
            .insert("python".into(), vec!["*.pyw".into(), "scripts/*".into()]);
        let selector = FileSelector::from_config(&config, &registry).unwrap();

        assert_eq!(
            selector.language_for(&registry, Path::new("tool.pyw")).map(|l| l.to_string()),
            Some("python".to_string())
        );
        assert_eq!(
            selector.language_for(&registry, Path::new("scripts/run")).map(|l| l.to_string()),
            Some("python".to_string())
        );
        assert_eq!(
            selector.language_for(&registry, Path::new("main.rs")).map(|l| l.to_string()),
            Some("rust".to_string())
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let registry = GrammarRegistry::builtin();
        let err = discover(
            &[PathBuf::from("/definitely/not/here")],
            &registry,
            &FileSelector::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn selector_rejects_what_validation_rejects() {
        let registry = GrammarRegistry::builtin();
        let mut config = ProjectConfig {
            ignore: vec!["[".into()],
            ..ProjectConfig::default()
        };
        config.language_globs.insert("klingon".into(), vec!["*.kl".into()]);
        config.language_globs.insert("python".into(), vec![]);

        let expected = config.validate(&registry).unwrap_err();
        let err = FileSelector::from_config(&config, &registry).unwrap_err();
        match err {
            ConfigError::Validation { source, .. } => {
                assert_eq!(source.issues.len(), 3);
                assert_eq!(source.to_string(), expected.to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
