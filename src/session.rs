//! Image capture session
//!
//! One [`CaptureEngine`] is launched per run and shared by every selected page.
//! Pages are processed strictly in order: title, markup, a fresh rendering
//! context, network-idle wait, viewport, screenshot, write. The engine is
//! closed exactly once when the loop ends, whether it finished or failed.

use crate::select::{CandidateFile, PathNormalizer};
use crate::template::Template;
use crate::title::extract_title;
use crate::{CaptureEngine, CapturePage, Error, Result, Viewport};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do when a selected page has no `<title>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the run at the first page without a title
    #[default]
    Abort,
    /// Log the page and continue with the next one
    Skip,
}

/// How output image names are derived from a page path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingScheme {
    /// `<parent dir>.png`; pages sharing a parent directory name overwrite each other
    #[default]
    ParentDir,
    /// `<parent dir>-<hash of the normalized path>.png`
    PathHash,
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Images written, in capture order
    pub generated: Vec<PathBuf>,
    /// Pages skipped without producing an image
    pub skipped: Vec<PathBuf>,
}

/// Create `path` if it does not exist yet.
///
/// Only the final component is created: a missing parent is an error, as is
/// any failure other than the directory already being there.
pub fn ensure_directory(path: &Path) -> Result<()> {
    match std::fs::create_dir(path) {
        Ok(()) => {
            debug!("Created directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(Error::DirectoryCreation {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Ensure `<output_root>/assets/<subdir>` exists, one level at a time, and
/// return it.
pub fn provision_asset_dir(output_root: &Path, subdir: &str) -> Result<PathBuf> {
    let mut dir = output_root.join("assets");
    ensure_directory(&dir)?;
    for part in Path::new(subdir).components() {
        dir.push(part);
        ensure_directory(&dir)?;
    }
    Ok(dir)
}

/// File name of the preview image for `page`.
pub fn output_file_name(page: &Path, scheme: NamingScheme, normalizer: &PathNormalizer) -> String {
    let base = page
        .parent()
        .and_then(Path::file_name)
        .or_else(|| page.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());

    match scheme {
        NamingScheme::ParentDir => format!("{}.png", base),
        NamingScheme::PathHash => {
            let digest = Sha256::digest(normalizer.normalize_path(page).as_bytes());
            format!("{}-{}.png", base, &hex::encode(digest)[..8])
        }
    }
}

/// Per-run capture settings
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub template: Template,
    pub asset_dir: PathBuf,
    pub viewport: Viewport,
    pub network_idle_timeout: Duration,
    pub on_missing_title: FailurePolicy,
    pub naming: NamingScheme,
    pub normalizer: PathNormalizer,
}

/// A launched engine plus the settings used to drive it
pub struct CaptureSession<E: CaptureEngine> {
    engine: E,
    options: CaptureOptions,
}

impl<E: CaptureEngine> CaptureSession<E> {
    pub fn new(engine: E, options: CaptureOptions) -> Self {
        Self { engine, options }
    }

    /// Capture every selected page, then close the engine.
    ///
    /// Images written before a failure stay on disk.
    pub fn run(self, selected: &[CandidateFile]) -> Result<GenerationReport> {
        let CaptureSession { mut engine, options } = self;

        let outcome = options.capture_all(&mut engine, selected);
        let closed = engine.close();

        match (outcome, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!("Failed to close browser after error: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

impl CaptureOptions {
    fn capture_all<E: CaptureEngine>(&self, engine: &mut E, selected: &[CandidateFile]) -> Result<GenerationReport> {
        let mut report = GenerationReport::default();
        let mut written = HashSet::new();

        for candidate in selected {
            if !candidate.is_resolved() {
                debug!("Skipping entry without a built file");
                continue;
            }

            let title = match extract_title(&candidate.path) {
                Ok(title) => title,
                Err(err @ Error::MissingTitle { .. }) if self.on_missing_title == FailurePolicy::Skip => {
                    warn!("{}; skipping", err);
                    report.skipped.push(candidate.path.clone());
                    continue;
                }
                Err(err) => return Err(err),
            };

            let output = self
                .asset_dir
                .join(output_file_name(&candidate.path, self.naming, &self.normalizer));
            if !written.insert(output.clone()) {
                warn!(
                    "{} overwrites an image generated earlier in this run ({})",
                    candidate.path.display(),
                    output.display()
                );
            }

            let png = self.capture(engine, &self.template.render(&title))?;
            std::fs::write(&output, png).map_err(|source| Error::CaptureWrite {
                path: output.clone(),
                source,
            })?;

            info!("Generated {} for \"{}\"", output.display(), title);
            report.generated.push(output);
        }

        Ok(report)
    }

    /// Render `html` in a fresh context and return the PNG bytes. The context
    /// is closed even when a step fails.
    fn capture<E: CaptureEngine>(&self, engine: &mut E, html: &str) -> Result<Vec<u8>> {
        let mut page = engine.new_page()?;
        let shot = self.render_into(&mut page, html);

        if let Err(e) = page.close() {
            warn!("Failed to close rendering context: {}", e);
        }
        shot
    }

    fn render_into<P: CapturePage>(&self, page: &mut P, html: &str) -> Result<Vec<u8>> {
        page.set_content(html)?;
        page.wait_for_network_idle(self.network_idle_timeout)?;
        page.set_viewport(self.viewport)?;
        page.capture_png()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_dir_naming() {
        let n = PathNormalizer::default();
        let name = output_file_name(Path::new("/site/dist/blog/post-1/index.html"), NamingScheme::ParentDir, &n);
        assert_eq!(name, "post-1.png");
    }

    #[test]
    fn path_hash_naming_separates_same_parent_names() {
        let n = PathNormalizer::default();
        let a = output_file_name(Path::new("/site/dist/blog/intro/index.html"), NamingScheme::PathHash, &n);
        let b = output_file_name(Path::new("/site/dist/docs/intro/index.html"), NamingScheme::PathHash, &n);
        assert!(a.starts_with("intro-") && a.ends_with(".png"));
        assert_ne!(a, b);
        assert_eq!(a.len(), "intro-".len() + 8 + ".png".len());
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("assets");
        ensure_directory(&target).unwrap();
        ensure_directory(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn ensure_directory_fails_without_parent() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_directory(&dir.path().join("missing/assets")).unwrap_err();
        assert!(matches!(err, Error::DirectoryCreation { .. }));
    }

    #[test]
    fn ensure_directory_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("assets");
        std::fs::write(&file, "not a dir").unwrap();
        assert!(ensure_directory(&file).is_err());
    }

    #[test]
    fn provision_creates_nested_asset_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = provision_asset_dir(dir.path(), "og").unwrap();
        assert_eq!(out, dir.path().join("assets/og"));
        assert!(out.is_dir());
        provision_asset_dir(dir.path(), "og").unwrap();
    }
}
