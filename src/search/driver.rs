use crate::discover::SourceFile;
use crate::error::Error;
use crate::grammar::GrammarRegistry;
use crate::matcher::{MatchRecord, Matcher};
use crate::search::{search, CancellationToken, SearchConfig};
use crate::tree::parse;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A file that could not be searched. The rest of the search is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiagnostic {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregate result of a multi-file search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Matches in file order, then document order, cut to `max_results`.
    pub matches: Vec<MatchRecord>,
    pub diagnostics: Vec<FileDiagnostic>,
    /// Matches found before `max_results` was applied.
    pub total_matches: usize,
    pub truncated: bool,
    pub files_searched: usize,
    /// Set when the token tripped before every file was searched.
    pub cancelled: bool,
}

enum FileOutcome {
    Cancelled,
    /// Records kept (at most `max_results`) and every match found.
    Searched(Vec<MatchRecord>, usize),
    Failed(FileDiagnostic),
}

/// Searches `files` with `matcher`, fanning out over a rayon pool.
///
/// Each file is read, parsed and searched independently. Results are put
/// back in the order of `files` before `max_results` is applied, so the
/// outcome does not depend on scheduling.
pub fn search_files(
    registry: &GrammarRegistry,
    files: &[SourceFile],
    matcher: &Matcher,
    config: &SearchConfig,
    cancel: &CancellationToken,
) -> Result<SearchOutcome, Error> {
    let start_time = Instant::now();

    let run = || -> Vec<(usize, FileOutcome)> {
        files
            .par_iter()
            .enumerate()
            .map(|(index, file)| {
                if cancel.is_cancelled() {
                    return (index, FileOutcome::Cancelled);
                }
                (index, search_file(registry, file, matcher, config))
            })
            .collect()
    };

    let mut indexed = if config.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|index| format!("syngrep-worker-{index}"))
            .build()?;
        pool.install(run)
    } else {
        run()
    };

    // Sort by original index to keep file order deterministic
    indexed.sort_by_key(|(index, _)| *index);

    let mut outcome = SearchOutcome::default();
    for (_, result) in indexed {
        match result {
            FileOutcome::Cancelled => outcome.cancelled = true,
            FileOutcome::Searched(records, found) => {
                outcome.files_searched += 1;
                outcome.total_matches += found;
                outcome.matches.extend(records);
            }
            FileOutcome::Failed(diagnostic) => outcome.diagnostics.push(diagnostic),
        }
    }

    if let Some(limit) = config.limit() {
        outcome.matches.truncate(limit);
    }
    outcome.truncated = outcome.total_matches > outcome.matches.len();

    if outcome.cancelled {
        info!(
            files_searched = outcome.files_searched,
            files = files.len(),
            "search cancelled"
        );
    }
    info!(
        files = files.len(),
        matches = outcome.total_matches,
        returned = outcome.matches.len(),
        diagnostics = outcome.diagnostics.len(),
        elapsed = ?start_time.elapsed(),
        "search finished"
    );
    Ok(outcome)
}

fn search_file(
    registry: &GrammarRegistry,
    file: &SourceFile,
    matcher: &Matcher,
    config: &SearchConfig,
) -> FileOutcome {
    if &file.language != matcher.language() {
        debug!(path = %file.path.display(), "language differs from matcher, skipping");
        return FileOutcome::Searched(Vec::new(), 0);
    }

    let failed = |message: String| {
        warn!(path = %file.path.display(), %message, "file skipped");
        FileOutcome::Failed(FileDiagnostic {
            path: file.path.clone(),
            message,
        })
    };

    let source = match fs::read_to_string(&file.path) {
        Ok(source) => source,
        Err(err) => return failed(format!("cannot read file: {err}")),
    };
    let grammar = match registry.grammar(&file.language) {
        Ok(grammar) => grammar,
        Err(err) => return failed(err.to_string()),
    };
    let tree = match parse(&source, grammar.as_ref()) {
        Ok(tree) => tree.with_path(&file.path),
        Err(err) => return failed(err.to_string()),
    };

    // Every match is counted, but only the first `max_results` are kept;
    // the global cut happens after merging.
    let uncapped = config.clone().with_max_results(None);
    let mut found = search(&tree, matcher, &uncapped);
    let records: Vec<MatchRecord> = match config.limit() {
        Some(limit) => found.by_ref().take(limit).map(|m| m.to_record()).collect(),
        None => found.by_ref().map(|m| m.to_record()).collect(),
    };
    let total = records.len() + found.count();
    FileOutcome::Searched(records, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::compile_pattern;
    use std::fs;
    use tempfile::TempDir;

    fn python_files(dir: &TempDir, registry: &GrammarRegistry, sources: &[(&str, &str)]) -> Vec<SourceFile> {
        let python = registry.resolve("python").unwrap();
        sources
            .iter()
            .map(|(name, body)| {
                let path = dir.path().join(name);
                fs::write(&path, body).unwrap();
                SourceFile {
                    path,
                    language: python.clone(),
                }
            })
            .collect()
    }

    #[test]
    fn results_follow_file_order_then_truncate() {
        let dir = TempDir::new().unwrap();
        let registry = GrammarRegistry::builtin();
        let files = python_files(
            &dir,
            &registry,
            &[
                ("z.py", "f(1)\nf(2)\n"),
                ("a.py", "f(3)\n"),
                ("m.py", "f(4)\nf(5)\n"),
            ],
        );
        let python = registry.resolve("python").unwrap();
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let config = SearchConfig::default().with_max_results(Some(4)).with_threads(2);
        let outcome = search_files(&registry, &files, &matcher, &config, &CancellationToken::new()).unwrap();

        let texts: Vec<_> = outcome.matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["f(1)", "f(2)", "f(3)", "f(4)"]);
        assert_eq!(outcome.total_matches, 5);
        assert!(outcome.truncated);
        assert_eq!(outcome.files_searched, 3);
        assert!(outcome.matches[0].file.as_deref().unwrap().ends_with("z.py"));
    }

    #[test]
    fn single_file_over_the_cap_counts_every_match() {
        let dir = TempDir::new().unwrap();
        let registry = GrammarRegistry::builtin();
        let files = python_files(&dir, &registry, &[("many.py", "f(1)\nf(2)\nf(3)\nf(4)\nf(5)\n")]);
        let python = registry.resolve("python").unwrap();
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let config = SearchConfig::default().with_max_results(Some(2));
        let outcome = search_files(&registry, &files, &matcher, &config, &CancellationToken::new()).unwrap();

        let texts: Vec<_> = outcome.matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["f(1)", "f(2)"]);
        assert_eq!(outcome.total_matches, 5);
        assert!(outcome.truncated);
    }

    #[test]
    fn under_the_cap_is_not_truncated() {
        let dir = TempDir::new().unwrap();
        let registry = GrammarRegistry::builtin();
        let files = python_files(&dir, &registry, &[("few.py", "f(1)\nf(2)\n")]);
        let python = registry.resolve("python").unwrap();
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let config = SearchConfig::default().with_max_results(Some(2));
        let outcome = search_files(&registry, &files, &matcher, &config, &CancellationToken::new()).unwrap();

        assert_eq!(outcome.total_matches, 2);
        assert!(!outcome.truncated);
    }

    #[test]
    fn unreadable_file_becomes_a_diagnostic() {
        let dir = TempDir::new().unwrap();
        let registry = GrammarRegistry::builtin();
        let files = python_files(&dir, &registry, &[("good.py", "f(1)\n"), ("bad.py", "")]);
        fs::write(&files[1].path, [0xff, 0xfe, 0x00, b'\n']).unwrap();
        let python = registry.resolve("python").unwrap();
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let outcome = search_files(
            &registry,
            &files,
            &matcher,
            &SearchConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].path.ends_with("bad.py"));
    }

    #[test]
    fn cancelled_token_skips_remaining_files() {
        let dir = TempDir::new().unwrap();
        let registry = GrammarRegistry::builtin();
        let files = python_files(&dir, &registry, &[("a.py", "f(1)\n"), ("b.py", "f(2)\n")]);
        let python = registry.resolve("python").unwrap();
        let matcher = compile_pattern(&registry, "f($X)", &python).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let outcome = search_files(&registry, &files, &matcher, &SearchConfig::default(), &token).unwrap();

        assert!(outcome.cancelled);
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.files_searched, 0);
    }
}
