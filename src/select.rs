//! Candidate discovery and pattern-based page selection
//!
//! Built pages are discovered on disk and matched against user patterns. The
//! match subject is a *normalized* path: the build output prefix, the output
//! root name and the index file name are stripped so that a pattern such as
//! `^/blog/` matches `/home/me/site/dist/blog/post-1/index.html`.

use crate::Result;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A built HTML file discovered under the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path of the built file. An empty path marks an entry that was never
    /// built and is skipped by the capture loop.
    pub path: PathBuf,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Whether this entry points at a real file path
    pub fn is_resolved(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }
}

/// A user-configured selection rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRule {
    /// Regular expression evaluated, unanchored, against the normalized path
    pub pattern: String,
}

impl SelectionRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into() }
    }
}

/// Strips build artifacts from candidate paths before matching
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    root_token: String,
    index_file: String,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new("dist", "index.html")
    }
}

impl PathNormalizer {
    pub fn new(root_token: impl Into<String>, index_file: impl Into<String>) -> Self {
        Self {
            root_token: root_token.into(),
            index_file: index_file.into(),
        }
    }

    /// Normalize a candidate path into the subject used for pattern matching.
    ///
    /// Everything up to and including the first (case-sensitive) occurrence of
    /// the root token is dropped, then every case-insensitive occurrence of the
    /// root token and of the index file name is removed. Removal repeats until
    /// nothing changes, which keeps the function idempotent even when a removal
    /// splices a new occurrence together.
    pub fn normalize(&self, path: &str) -> String {
        let mut out = match path.find(self.root_token.as_str()) {
            Some(idx) if !self.root_token.is_empty() => path[idx + self.root_token.len()..].to_string(),
            _ => path.to_string(),
        };

        loop {
            let next = remove_all_ci(&remove_all_ci(&out, &self.root_token), &self.index_file);
            if next == out {
                return out;
            }
            out = next;
        }
    }

    pub fn normalize_path(&self, path: &Path) -> String {
        self.normalize(&path.to_string_lossy())
    }
}

/// Remove every ASCII case-insensitive occurrence of `needle` from `haystack`.
fn remove_all_ci(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }

    // ASCII lowercasing keeps byte offsets aligned with the original string
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(needle.as_str()) {
        out.push_str(&haystack[last..idx]);
        last = idx + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}

/// Filters candidates by a compiled set of selection rules
#[derive(Debug, Clone)]
pub struct RouteSelector {
    rules: Vec<Regex>,
    normalizer: PathNormalizer,
}

impl RouteSelector {
    /// Compile the rules once. A pattern that fails to compile is a
    /// configuration error.
    pub fn new(rules: &[SelectionRule], normalizer: PathNormalizer) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|r| Regex::new(&r.pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { rules, normalizer })
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// True when any rule matches the candidate's normalized path
    pub fn matches(&self, path: &Path) -> bool {
        let subject = self.normalizer.normalize_path(path);
        self.rules.iter().any(|re| re.is_match(&subject))
    }

    /// Keep the candidates at least one rule matches, in input order. With no
    /// rules configured every candidate is kept.
    pub fn select(&self, candidates: Vec<CandidateFile>) -> Vec<CandidateFile> {
        if self.rules.is_empty() {
            return candidates;
        }

        let total = candidates.len();
        let selected: Vec<CandidateFile> = candidates.into_iter().filter(|c| self.matches(&c.path)).collect();
        debug!("Selected {} of {} candidate pages", selected.len(), total);
        selected
    }
}

/// Select candidates against `rules` using the default normalizer.
pub fn select(candidates: Vec<CandidateFile>, rules: &[SelectionRule]) -> Result<Vec<CandidateFile>> {
    Ok(RouteSelector::new(rules, PathNormalizer::default())?.select(candidates))
}

/// Recursively enumerate every `*.html` file under `root`, sorted by file name
/// within each directory.
pub fn discover(root: &Path) -> Result<Vec<CandidateFile>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "html") {
            found.push(CandidateFile::new(entry.into_path()));
        }
    }
    debug!("Discovered {} html files under {}", found.len(), root.display());
    Ok(found)
}
