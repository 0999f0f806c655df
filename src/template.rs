//! Preview markup template

use crate::{Error, Result};
use std::path::Path;

/// Placeholder replaced by the page title
pub const TITLE_TOKEN: &str = "@title";

/// Substitute the first `@title` token in `source` with `title`.
///
/// Only the first occurrence is replaced and the title is inserted verbatim,
/// without HTML escaping.
pub fn render(source: &str, title: &str) -> String {
    source.replacen(TITLE_TOKEN, title, 1)
}

/// An HTML template loaded once per run
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    /// Load the template text. Relative paths resolve against the process
    /// working directory.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;
        if !source.contains(TITLE_TOKEN) {
            log::warn!("Template {} has no {} placeholder", path.display(), TITLE_TOKEN);
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, title: &str) -> String {
        render(&self.source, title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_only_first_token() {
        assert_eq!(render("@title @title", "Hi"), "Hi @title");
    }

    #[test]
    fn inserts_title_verbatim() {
        assert_eq!(render("<h1>@title</h1>", "<b>A & B</b>"), "<h1><b>A & B</b></h1>");
    }

    #[test]
    fn missing_template_is_template_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Template::load(&dir.path().join("og-image.html")).unwrap_err();
        assert!(matches!(err, Error::TemplateRead { .. }));
    }

    #[test]
    fn load_then_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("og-image.html");
        std::fs::write(&path, "<h1>@title</h1>").unwrap();
        let t = Template::load(&path).unwrap();
        assert_eq!(t.render("Post"), "<h1>Post</h1>");
    }
}
