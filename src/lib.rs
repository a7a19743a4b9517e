//! Sitebind
//!
//! Binds data records into a static HTML template (link targets, media
//! sources and visible text, looked up by element id) and captures rendered
//! previews of the resulting page at a mobile and a desktop viewport.
//!
//! # Features
//!
//! - **Binder** (always on): pure, deterministic template binding
//! - **CDP Backend** (`cdp`): screenshot capture via headless Chrome
//!
//! # Example
//!
//! ```
//! use sitebind::{bind_markup, BindingRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let template = r#"<!DOCTYPE html><html><head></head><body>
//!     <img id="avatar"><a id="profile">profile</a>
//! </body></html>"#;
//! let records = vec![
//!     BindingRecord::new("avatar", "ada.png", Some("ignored/")),
//!     BindingRecord::new("profile", "ada", Some("https://example.com/")),
//! ];
//! let markup = bind_markup(template, "body { margin: 0 }", "init();", &records)?;
//! assert!(markup.contains(r#"src="ada.png""#));
//! assert!(markup.contains(r#"href="https://example.com/ada""#));
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod record;
pub use record::BindingRecord;

pub mod binder;
pub use binder::{bind, bind_markup};

pub mod sources;
pub use sources::{SiteLayout, TemplateSources};

pub mod policy;
pub use policy::RequestPolicy;

pub mod capture;
pub use capture::{capture_preview, preview_site, Preview, Screenshots};

// Chrome DevTools backend for screenshot capture
#[cfg(feature = "cdp")]
pub mod cdp;

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Phone-sized preview
    pub const MOBILE: Viewport = Viewport {
        width: 412,
        height: 915,
    };

    /// Laptop-sized preview
    pub const DESKTOP: Viewport = Viewport {
        width: 1280,
        height: 800,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// Configuration for preview capture
///
/// # Examples
///
/// ```
/// let cfg = sitebind::CaptureConfig::default();
/// assert_eq!(cfg.mobile.width, 412);
/// assert!(!cfg.policy.allows("https://api.zitefy.com/track"));
/// ```
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Browser executable; `None` lets the backend locate one
    pub chrome_path: Option<PathBuf>,
    /// Bound on waiting for the page to finish navigating
    pub navigation_timeout_ms: u64,
    /// Bound on the whole capture, launch to last screenshot
    pub capture_timeout_ms: u64,
    /// Pause after load and after each resize so the page can settle
    pub settle_ms: u64,
    pub mobile: Viewport,
    pub desktop: Viewport,
    /// Which outgoing requests the page may make
    pub policy: RequestPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            navigation_timeout_ms: 30000,
            capture_timeout_ms: 60000,
            settle_ms: 500,
            mobile: Viewport::MOBILE,
            desktop: Viewport::DESKTOP,
            policy: RequestPolicy::default(),
        }
    }
}

/// A rendering backend able to load a page and rasterize it.
///
/// Implementations are created, used and closed on a single worker thread by
/// [`capture_preview`], so they need not be `Send`.
pub trait Renderer {
    /// Launch the backend with the given configuration
    fn new(config: CaptureConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait for the page to be ready
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Resize to `viewport` and render the current page as PNG bytes
    fn render_png(&mut self, viewport: Viewport) -> Result<Vec<u8>>;

    /// Release the backend and everything it launched
    fn close(self) -> Result<()>;
}
