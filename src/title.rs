//! Page title extraction

use crate::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// Attributes allowed on the opening tag; the body may not contain `<`.
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<title[^>]*>([^<]+)</title>").unwrap());

/// Return the text of the first `<title>` tag in `html`, if any.
pub fn find_title(html: &str) -> Option<&str> {
    TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Read a built page and extract its title.
///
/// Invalid UTF-8 is replaced rather than rejected. Fails with
/// [`Error::MissingTitle`] when the page has no non-empty title tag.
pub fn extract_title(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::PageRead {
        path: path.to_path_buf(),
        source,
    })?;
    let html = String::from_utf8_lossy(&bytes);

    find_title(&html)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingTitle { path: path.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_plain_title() {
        assert_eq!(find_title("<html><title>Hello</title></html>"), Some("Hello"));
    }

    #[test]
    fn allows_attributes_and_takes_first() {
        let html = r#"<head><title data-x="1">First</title></head><title>Second</title>"#;
        assert_eq!(find_title(html), Some("First"));
    }

    #[test]
    fn rejects_missing_or_empty_title() {
        assert_eq!(find_title("<html><head></head></html>"), None);
        assert_eq!(find_title("<title></title>"), None);
    }

    #[test]
    fn extract_title_reports_missing_title_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, "<html><body>no title</body></html>").unwrap();

        match extract_title(&page) {
            Err(Error::MissingTitle { path }) => assert_eq!(path, page),
            other => panic!("expected MissingTitle, got {:?}", other),
        }
    }

    #[test]
    fn extract_title_tolerates_invalid_utf8_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, b"<html><title>Cafe</title><body>caf\xE9</body></html>").unwrap();
        assert_eq!(extract_title(&page).unwrap(), "Cafe");
    }

    #[test]
    fn extract_title_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        std::fs::write(&page, "<html><title>Hello</title></html>").unwrap();
        assert_eq!(extract_title(&page).unwrap(), "Hello");
    }
}
