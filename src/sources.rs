//! Loading template sources from disk.
//!
//! Every read happens before any document is built, so an I/O failure is
//! reported with the offending path and never leaves partial output behind.

use crate::record::{load_records, BindingRecord};
use crate::{bind_markup, Error, Result};
use std::path::{Path, PathBuf};

/// Template markup plus the inline stylesheet and script to embed
#[derive(Debug, Clone)]
pub struct TemplateSources {
    pub markup: String,
    pub stylesheet: String,
    pub script: String,
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::source_io(path, e))
}

impl TemplateSources {
    /// Read the three template files.
    pub fn load(
        markup: impl AsRef<Path>,
        stylesheet: impl AsRef<Path>,
        script: impl AsRef<Path>,
    ) -> Result<Self> {
        Ok(Self {
            markup: read_source(markup.as_ref())?,
            stylesheet: read_source(stylesheet.as_ref())?,
            script: read_source(script.as_ref())?,
        })
    }

    /// Bind records into a fresh parse of the markup.
    pub fn bind(&self, records: &[BindingRecord]) -> Result<String> {
        bind_markup(&self.markup, &self.stylesheet, &self.script, records)
    }
}

/// On-disk layout of a site or template directory:
///
/// ```text
/// <root>/index.html
/// <root>/styles/styles.css
/// <root>/js/script.js
/// <root>/previews/{mobile,desktop}.png
/// ```
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn markup_path(&self) -> PathBuf {
        self.root.join("index.html")
    }

    pub fn stylesheet_path(&self) -> PathBuf {
        self.root.join("styles").join("styles.css")
    }

    pub fn script_path(&self) -> PathBuf {
        self.root.join("js").join("script.js")
    }

    pub fn previews_dir(&self) -> PathBuf {
        self.root.join("previews")
    }

    pub fn load_sources(&self) -> Result<TemplateSources> {
        TemplateSources::load(self.markup_path(), self.stylesheet_path(), self.script_path())
    }

    /// Build the site's markup. Without a records file only the style and
    /// script are embedded.
    pub fn build(&self, data: Option<&Path>) -> Result<String> {
        let sources = self.load_sources()?;
        let records = match data {
            Some(path) => load_records(path)?,
            None => Vec::new(),
        };
        sources.bind(&records)
    }
}
