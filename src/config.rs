//! Generator configuration
//!
//! The configuration is a small JSON document. Every field is optional and
//! falls back to [`GeneratorConfig::default`]:
//!
//! ```json
//! {
//!   "path": "og",
//!   "patterns": [{ "pattern": "^/blog/" }],
//!   "template": "og-image.html",
//!   "networkIdleTimeoutMs": 30000,
//!   "onMissingTitle": "abort",
//!   "naming": "parent-dir",
//!   "rootToken": "dist"
//! }
//! ```

use crate::select::{PathNormalizer, SelectionRule};
use crate::session::{FailurePolicy, NamingScheme};
use crate::{EngineConfig, Error, Result, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Default template file, resolved from the working directory
pub const DEFAULT_TEMPLATE: &str = "og-image.html";

/// Root token used when neither the config nor the output directory names one
pub const DEFAULT_ROOT_TOKEN: &str = "dist";

/// Slack between the per-page idle wait and Chrome's own idle-browser timeout
const BROWSER_IDLE_MARGIN_MS: u64 = 10_000;

/// Configuration for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Subdirectory of `<output>/assets/` that receives the images
    pub path: String,
    /// Selection rules; empty selects every built page
    pub patterns: Vec<SelectionRule>,
    /// HTML template containing one `@title` token
    pub template: PathBuf,
    /// Capture size in CSS pixels
    pub viewport: Viewport,
    /// Upper bound on the network-idle wait per page
    pub network_idle_timeout_ms: u64,
    /// What to do with a selected page that has no title
    pub on_missing_title: FailurePolicy,
    /// How output file names are derived
    pub naming: NamingScheme,
    /// Build output root name stripped before matching; defaults to the
    /// output directory's own name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_token: Option<String>,
    /// Index file name stripped before matching
    pub index_file: String,
    /// Explicit Chrome binary; autodetected when unset
    pub chrome_path: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            path: "og".to_string(),
            patterns: Vec::new(),
            template: PathBuf::from(DEFAULT_TEMPLATE),
            viewport: Viewport::default(),
            network_idle_timeout_ms: 30000,
            on_missing_title: FailurePolicy::default(),
            naming: NamingScheme::default(),
            root_token: None,
            index_file: "index.html".to_string(),
            chrome_path: None,
        }
    }
}

impl GeneratorConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(Error::Config(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        let path = Path::new(&self.path);
        if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(Error::Config(format!("path must stay inside the assets directory: {}", self.path)));
        }
        Ok(())
    }

    /// Root token stripped by the normalizer for a site built into `output_dir`.
    pub fn root_token_for(&self, output_dir: &Path) -> String {
        if let Some(token) = &self.root_token {
            return token.clone();
        }
        output_dir
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ROOT_TOKEN)
            .to_string()
    }

    pub fn normalizer_for(&self, output_dir: &Path) -> PathNormalizer {
        PathNormalizer::new(self.root_token_for(output_dir), self.index_file.clone())
    }

    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        // Chrome must not reap itself while a page is still settling
        let idle_browser_timeout_ms = defaults
            .idle_browser_timeout_ms
            .max(self.network_idle_timeout_ms.saturating_add(BROWSER_IDLE_MARGIN_MS));
        EngineConfig {
            viewport: self.viewport,
            chrome_path: self.chrome_path.clone(),
            idle_browser_timeout_ms,
            ..defaults
        }
    }
}
