//! Preview capture: render bound markup at the mobile and desktop viewports.
//!
//! The renderer lives on a dedicated worker thread for the whole invocation
//! and is closed there on every exit path. The async caller only waits, with
//! an overall deadline, for the pair of PNG buffers; files are written after
//! both screenshots exist, so a failed or timed-out capture writes nothing.

use crate::sources::SiteLayout;
use crate::{CaptureConfig, Error, Renderer, Result, Viewport};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Output locations for a preview pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub mobile: PathBuf,
    pub desktop: PathBuf,
}

impl Preview {
    /// `mobile.png` and `desktop.png` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            mobile: dir.join("mobile.png"),
            desktop: dir.join("desktop.png"),
        }
    }
}

/// PNG bytes for both viewports
#[derive(Debug, Clone)]
pub struct Screenshots {
    pub mobile: Vec<u8>,
    pub desktop: Vec<u8>,
}

impl Screenshots {
    /// Write both images; if the second write fails the first is removed.
    pub fn write_to(&self, preview: &Preview) -> Result<()> {
        fs::write(&preview.mobile, &self.mobile)
            .map_err(|e| Error::source_io(&preview.mobile, e))?;
        if let Err(e) = fs::write(&preview.desktop, &self.desktop) {
            let _ = fs::remove_file(&preview.mobile);
            return Err(Error::source_io(&preview.desktop, e));
        }
        Ok(())
    }
}

/// `file://` URL for a markup file on disk
pub fn file_url(path: &Path) -> Result<String> {
    let absolute = fs::canonicalize(path).map_err(|e| Error::source_io(path, e))?;
    url::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| Error::LoadError(format!("Cannot express {} as a file URL", absolute.display())))
}

/// Hex SHA-256 of the markup
pub fn content_digest(markup: &str) -> String {
    hex::encode(Sha256::digest(markup.as_bytes()))
}

/// Markup written into a private scratch directory for the renderer to load.
///
/// Each invocation gets its own directory, so concurrent captures of the same
/// markup never share a file. The directory is removed on drop.
#[derive(Debug)]
pub struct ScratchMarkup {
    dir: TempDir,
    path: PathBuf,
}

impl ScratchMarkup {
    pub fn write(markup: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sitebind-")
            .tempdir()
            .map_err(|e| Error::source_io(std::env::temp_dir(), e))?;
        let digest = content_digest(markup);
        let path = dir.path().join(format!("{}.html", &digest[..16]));
        fs::write(&path, markup).map_err(|e| Error::source_io(&path, e))?;
        debug!("Scratch markup at {}", path.display());
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

fn shoot_both<R: Renderer>(
    renderer: &mut R,
    url: &str,
    mobile: Viewport,
    desktop: Viewport,
) -> Result<Screenshots> {
    renderer.load_url(url)?;
    let mobile = renderer.render_png(mobile)?;
    let desktop = renderer.render_png(desktop)?;
    Ok(Screenshots { mobile, desktop })
}

/// Launch `R`, load `url` and render both viewports, closing the renderer
/// whether or not rendering succeeded.
pub fn render_pair<R: Renderer>(config: CaptureConfig, url: &str) -> Result<Screenshots> {
    let (mobile, desktop) = (config.mobile, config.desktop);
    let mut renderer = R::new(config)?;
    let shots = shoot_both(&mut renderer, url, mobile, desktop);
    let closed = renderer.close();
    let shots = shots?;
    closed?;
    Ok(shots)
}

/// Capture `markup` at both viewports into `preview`.
///
/// Fails with [`Error::Timeout`] when the whole capture exceeds
/// `config.capture_timeout_ms`; the worker still closes its renderer once it
/// unblocks, and its late result is discarded.
pub async fn capture_preview<R: Renderer + 'static>(
    config: CaptureConfig,
    markup: &Path,
    preview: &Preview,
) -> Result<()> {
    let url = file_url(markup)?;
    let deadline = config.capture_timeout_ms;
    let (tx, rx) = oneshot::channel();

    info!("Capturing {} into {:?}", url, preview);
    thread::spawn(move || {
        let _ = tx.send(render_pair::<R>(config, &url));
    });

    let shots = match tokio::time::timeout(Duration::from_millis(deadline), rx).await {
        Ok(Ok(res)) => res?,
        Ok(Err(e)) => return Err(Error::Other(format!("Capture worker canceled: {}", e))),
        Err(_) => {
            warn!("Capture exceeded {}ms, abandoning", deadline);
            return Err(Error::Timeout(deadline));
        }
    };

    shots.write_to(preview)?;
    info!(
        "Wrote previews {} ({} bytes) and {} ({} bytes)",
        preview.mobile.display(),
        shots.mobile.len(),
        preview.desktop.display(),
        shots.desktop.len()
    );
    Ok(())
}

/// Build a site directory and capture its previews into `<root>/previews`.
pub async fn preview_site<R: Renderer + 'static>(
    layout: &SiteLayout,
    data: Option<&Path>,
    config: CaptureConfig,
) -> Result<Preview> {
    let markup = layout.build(data)?;
    let dir = layout.previews_dir();
    fs::create_dir_all(&dir).map_err(|e| Error::source_io(&dir, e))?;

    let scratch = ScratchMarkup::write(&markup)?;
    let preview = Preview::in_dir(&dir);
    capture_preview::<R>(config, scratch.path(), &preview).await?;
    Ok(preview)
}

/// Write a readable diagnostic for a failed capture.
pub fn write_error_log(path: &Path, err: &Error) -> Result<()> {
    let mut report = format!("capture failed: {}\n", err);
    let mut cause = std::error::Error::source(err);
    while let Some(c) = cause {
        report.push_str(&format!("  caused by: {}\n", c));
        cause = std::error::Error::source(c);
    }
    fs::write(path, report).map_err(|e| Error::source_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_in_dir_names() {
        let p = Preview::in_dir("/sites/abc/previews");
        assert_eq!(p.mobile, PathBuf::from("/sites/abc/previews/mobile.png"));
        assert_eq!(p.desktop, PathBuf::from("/sites/abc/previews/desktop.png"));
    }

    #[test]
    fn digest_is_stable_hex() {
        let d = content_digest("<html></html>");
        assert_eq!(d.len(), 64);
        assert_eq!(d, content_digest("<html></html>"));
        assert_ne!(d, content_digest("<html> </html>"));
    }

    #[test]
    fn scratch_markup_is_removed_on_drop() {
        let (dir, path) = {
            let scratch = ScratchMarkup::write("<p>hi</p>").unwrap();
            assert_eq!(fs::read_to_string(scratch.path()).unwrap(), "<p>hi</p>");
            (scratch.dir().to_path_buf(), scratch.path().to_path_buf())
        };
        assert!(!path.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn identical_markup_gets_separate_scratch_dirs() {
        let a = ScratchMarkup::write("<p>same</p>").unwrap();
        let b = ScratchMarkup::write("<p>same</p>").unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.path().file_name(), b.path().file_name());
        drop(a);
        assert_eq!(fs::read_to_string(b.path()).unwrap(), "<p>same</p>");
    }

    #[test]
    fn file_url_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(&page, "<p></p>").unwrap();
        let url = file_url(&page).unwrap();
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("/page.html"));
    }

    #[test]
    fn file_url_for_missing_file_is_a_source_error() {
        assert!(matches!(
            file_url(Path::new("/nonexistent/page.html")),
            Err(Error::Source { .. })
        ));
    }

    #[test]
    fn error_log_contains_cause() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("error.log");
        let err = Error::source_io(
            "/tmp/x.html",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        write_error_log(&log_path, &err).unwrap();
        let text = fs::read_to_string(&log_path).unwrap();
        assert!(text.starts_with("capture failed: Failed to access /tmp/x.html"));
        assert!(text.contains("caused by: gone"));
    }

    #[test]
    fn timeout_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("error.log");
        write_error_log(&log_path, &Error::Timeout(30000)).unwrap();
        let text = fs::read_to_string(&log_path).unwrap();
        assert_eq!(text, "capture failed: Operation timed out after 30000ms\n");
    }
}
