//! ogshot
//!
//! Post-build open-graph image generation for static sites. After a site is
//! built, ogshot picks the generated pages whose paths match a set of regular
//! expressions, renders an HTML template with each page's title in a headless
//! browser, and writes a 1200×630 PNG per page under `<output>/assets/<path>/`.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Engine trait**: the pipeline drives any [`CaptureEngine`], which keeps
//!   selection, templating and output naming testable without a browser
//! - **One browser per run**: launched after the asset directory is ready and
//!   closed exactly once, on success and on failure
//!
//! # Example
//!
//! ```no_run
//! use ogshot::{GeneratorConfig, SelectionRule};
//! use ogshot::routes::LogSink;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeneratorConfig {
//!     path: "og".to_string(),
//!     patterns: vec![SelectionRule::new("^/blog/")],
//!     ..Default::default()
//! };
//!
//! let report = ogshot::run(&config, std::path::Path::new("dist"), &[], &mut LogSink)?;
//! println!("Generated {} images", report.generated.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub mod routes;
pub mod select;
pub mod session;
pub mod template;
pub mod title;

// Chrome DevTools Protocol backend
#[cfg(feature = "cdp")]
pub mod cdp;

pub use config::GeneratorConfig;
pub use routes::{BuildRoute, RouteSink};
pub use select::{CandidateFile, PathNormalizer, RouteSelector, SelectionRule};
pub use session::{CaptureOptions, CaptureSession, FailurePolicy, GenerationReport, NamingScheme};

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    /// The canonical open-graph image size
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
        }
    }
}

/// Launch configuration for a rendering engine
///
/// The OS sandbox is disabled by default because builds commonly run in
/// containers where Chrome cannot set it up.
///
/// # Examples
///
/// ```
/// let cfg = ogshot::EngineConfig::default();
/// assert!(!cfg.sandbox);
/// assert_eq!(cfg.viewport.width, 1200);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial window size
    pub viewport: Viewport,
    /// Whether to keep the OS sandbox enabled
    pub sandbox: bool,
    /// Explicit browser binary; autodetected when `None`
    pub chrome_path: Option<PathBuf>,
    /// How long the browser may sit idle between commands before it is
    /// considered dead, in milliseconds
    pub idle_browser_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            sandbox: false,
            chrome_path: None,
            idle_browser_timeout_ms: 120_000,
        }
    }
}

/// A headless rendering engine shared by all pages of a run
pub trait CaptureEngine {
    /// Rendering context type produced by [`CaptureEngine::new_page`]
    type Page: CapturePage;

    /// Start the engine
    fn launch(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Open a fresh rendering context (a tab)
    fn new_page(&mut self) -> Result<Self::Page>;

    /// Shut the engine down and release its process
    fn close(self) -> Result<()>;
}

/// One isolated rendering context inside a [`CaptureEngine`]
pub trait CapturePage {
    /// Load `html` as the document of this context
    fn set_content(&mut self, html: &str) -> Result<()>;

    /// Block until no network requests are in flight, or fail with
    /// [`Error::Timeout`] once `timeout` elapses
    fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Fix the rendering viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Capture the viewport as PNG bytes
    fn capture_png(&mut self) -> Result<Vec<u8>>;

    /// Discard the context
    fn close(self) -> Result<()>;
}

/// Resolve the host's output directory handle, given either as a plain path
/// or as a `file://` URL.
pub fn output_dir_from_handle(handle: &str) -> Result<PathBuf> {
    if handle.starts_with("file:") {
        let url = url::Url::parse(handle).map_err(|e| Error::Config(format!("invalid output URL {}: {}", handle, e)))?;
        return url
            .to_file_path()
            .map_err(|_| Error::Config(format!("output URL is not a local path: {}", handle)));
    }
    Ok(PathBuf::from(handle))
}

/// Run the whole post-build step with a caller-supplied engine launcher.
///
/// Prints every known route to `sink`, selects the built pages, provisions
/// the asset directory, loads the template, and only then launches the engine
/// and captures the selected pages.
pub fn run_with<E, L>(
    config: &GeneratorConfig,
    output_dir: &Path,
    routes: &[BuildRoute],
    sink: &mut dyn RouteSink,
    launch: L,
) -> Result<GenerationReport>
where
    E: CaptureEngine,
    L: FnOnce(EngineConfig) -> Result<E>,
{
    config.validate()?;

    routes::print_routes(sink, routes);
    let by_component = routes::filter_by_component(routes, &config.path);
    log::debug!("{} of {} routes reference '{}'", by_component.len(), routes.len(), config.path);

    let selector = RouteSelector::new(&config.patterns, config.normalizer_for(output_dir))?;
    let selected = selector.select(select::discover(output_dir)?);

    let asset_dir = session::provision_asset_dir(output_dir, &config.path)?;
    let template = template::Template::load(&config.template)?;

    let options = CaptureOptions {
        template,
        asset_dir,
        viewport: config.viewport,
        network_idle_timeout: Duration::from_millis(config.network_idle_timeout_ms),
        on_missing_title: config.on_missing_title,
        naming: config.naming,
        normalizer: selector.normalizer().clone(),
    };

    let engine = launch(config.engine_config())?;
    CaptureSession::new(engine, options).run(&selected)
}

/// Run the post-build step with the headless Chrome backend.
#[cfg(feature = "cdp")]
pub fn run(
    config: &GeneratorConfig,
    output_dir: &Path,
    routes: &[BuildRoute],
    sink: &mut dyn RouteSink,
) -> Result<GenerationReport> {
    run_with(config, output_dir, routes, sink, cdp::CdpEngine::launch)
}
