//! Glob resolution against a materialized build context
//!
//! Patterns follow copy-instruction semantics: they are relative to the
//! context root and `*` does not cross path separators. A pattern that
//! names a directory selects every file beneath it.

use globset::GlobBuilder;
use std::path::Path;
use walkdir::WalkDir;

/// Options for glob resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct StatOptions {
    /// Flag archive-like matches (`.tar`, `.tar.gz`, ...) so add-style
    /// instructions can account for automatic extraction
    pub check_for_archives: bool,
}

/// A single file matched by a glob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatMatch {
    /// Path relative to the context root, forward-slash separated
    pub rel_path: String,

    /// Whether the entry looks like an archive (always false unless
    /// `check_for_archives` was set)
    pub is_archive: bool,
}

/// Resolution result for one requested glob.
///
/// A failed resolution keeps the pattern alongside the reason so callers
/// can report exactly which glob broke.
#[derive(Debug, Clone)]
pub struct GlobStat {
    pub glob: String,
    pub matches: Vec<StatMatch>,
    pub error: Option<String>,
}

const ARCHIVE_SUFFIXES: &[&str] = &[".tar", ".tar.gz", ".tgz", ".tar.bz2", ".tar.xz"];

/// Resolve each glob against the context directory.
///
/// One `GlobStat` is returned per requested glob, in request order.
/// Failures (malformed pattern, unreadable directory) are recorded on the
/// affected glob instead of aborting the whole resolution; the caller
/// decides whether a single bad glob fails the operation.
pub fn stat_globs(dir: &Path, globs: &[String], options: StatOptions) -> Vec<GlobStat> {
    globs
        .iter()
        .map(|glob| stat_one_glob(dir, glob, options))
        .collect()
}

fn stat_one_glob(dir: &Path, glob: &str, options: StatOptions) -> GlobStat {
    let pattern = normalize_pattern(glob);

    let matcher = match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(compiled) => compiled.compile_matcher(),
        Err(e) => {
            return GlobStat {
                glob: glob.to_string(),
                matches: Vec::new(),
                error: Some(format!("invalid pattern: {e}")),
            };
        }
    };

    let mut matches = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                return GlobStat {
                    glob: glob.to_string(),
                    matches: Vec::new(),
                    error: Some(format!("walking context: {e}")),
                };
            }
        };

        let rel_path = match relative_slash_path(dir, entry.path()) {
            Some(rel) => rel,
            None => continue,
        };

        if !matcher.is_match(&rel_path) {
            continue;
        }

        if entry.file_type().is_dir() {
            // A directory match selects its whole subtree
            match collect_files_under(dir, entry.path()) {
                Ok(files) => matches.extend(files),
                Err(reason) => {
                    return GlobStat {
                        glob: glob.to_string(),
                        matches: Vec::new(),
                        error: Some(reason),
                    };
                }
            }
        } else {
            matches.push(StatMatch {
                rel_path,
                is_archive: false,
            });
        }
    }

    if options.check_for_archives {
        for matched in &mut matches {
            matched.is_archive = has_archive_suffix(&matched.rel_path);
        }
    }

    GlobStat {
        glob: glob.to_string(),
        matches,
        error: None,
    }
}

/// Strip the `./` and `/` decorations copy instructions commonly carry.
fn normalize_pattern(glob: &str) -> &str {
    let mut pattern = glob;
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern = pattern.trim_start_matches('/');
    pattern.trim_end_matches('/')
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(joined)
}

fn collect_files_under(root: &Path, dir: &Path) -> Result<Vec<StatMatch>, String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| format!("walking {}: {e}", dir.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Some(rel_path) = relative_slash_path(root, entry.path()) {
            files.push(StatMatch {
                rel_path,
                is_archive: false,
            });
        }
    }
    Ok(files)
}

fn has_archive_suffix(rel_path: &str) -> bool {
    ARCHIVE_SUFFIXES
        .iter()
        .any(|suffix| rel_path.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn options() -> StatOptions {
        StatOptions::default()
    }

    #[test]
    fn literal_path_matches_one_file() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/app.bin"), "binary").unwrap();

        let stats = stat_globs(temp.path(), &["src/app.bin".to_string()], options());
        assert_eq!(stats.len(), 1);
        assert!(stats[0].error.is_none());
        assert_eq!(stats[0].matches.len(), 1);
        assert_eq!(stats[0].matches[0].rel_path, "src/app.bin");
    }

    #[test]
    fn star_does_not_cross_separators() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("top.txt"), "top").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested/deep.txt"), "deep").unwrap();

        let stats = stat_globs(temp.path(), &["*.txt".to_string()], options());
        let rel_paths: Vec<&str> = stats[0]
            .matches
            .iter()
            .map(|m| m.rel_path.as_str())
            .collect();
        assert_eq!(rel_paths, vec!["top.txt"]);
    }

    #[test]
    fn directory_match_selects_subtree() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("assets/img")).unwrap();
        fs::write(temp.path().join("assets/style.css"), "css").unwrap();
        fs::write(temp.path().join("assets/img/logo.png"), "png").unwrap();

        let stats = stat_globs(temp.path(), &["assets".to_string()], options());
        let rel_paths: Vec<&str> = stats[0]
            .matches
            .iter()
            .map(|m| m.rel_path.as_str())
            .collect();
        assert_eq!(rel_paths, vec!["assets/img/logo.png", "assets/style.css"]);
    }

    #[test]
    fn invalid_pattern_keeps_the_glob() {
        let temp = tempdir().unwrap();
        let stats = stat_globs(temp.path(), &["[bad".to_string()], options());
        assert_eq!(stats[0].glob, "[bad");
        assert!(stats[0].error.is_some());
        assert!(stats[0].matches.is_empty());
    }

    #[test]
    fn missing_file_yields_empty_matches_not_error() {
        let temp = tempdir().unwrap();
        let stats = stat_globs(temp.path(), &["missing/*.txt".to_string()], options());
        assert!(stats[0].error.is_none());
        assert!(stats[0].matches.is_empty());
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("file.txt"), "x").unwrap();

        let stats = stat_globs(temp.path(), &["./file.txt".to_string()], options());
        assert_eq!(stats[0].matches.len(), 1);
    }

    #[test]
    fn archives_are_flagged_when_requested() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("vendor.tar.gz"), "gz").unwrap();
        fs::write(temp.path().join("plain.txt"), "txt").unwrap();

        let stats = stat_globs(
            temp.path(),
            &["*".to_string()],
            StatOptions {
                check_for_archives: true,
            },
        );
        let archive_flags: Vec<(&str, bool)> = stats[0]
            .matches
            .iter()
            .map(|m| (m.rel_path.as_str(), m.is_archive))
            .collect();
        assert!(archive_flags.contains(&("vendor.tar.gz", true)));
        assert!(archive_flags.contains(&("plain.txt", false)));
    }

    #[test]
    fn one_stat_per_requested_glob_in_order() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let globs = vec!["a.txt".to_string(), "b.txt".to_string()];
        let stats = stat_globs(temp.path(), &globs, options());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].glob, "a.txt");
        assert_eq!(stats[1].glob, "b.txt");
    }
}
