//! Title catalog collaborators
//!
//! The deck only reads entries by index. Sources produce the ordered list:
//! - [`MockCatalog`] for demo data
//! - [`DirectoryCatalog`] for a folder of media files

use crate::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{error, info};
use url::Url;

/// One browsable title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Name shown on the card and in the overlay
    pub display_name: String,
    /// True when `source` points at a playable file
    pub is_playable_file: bool,
    /// Where the content lives
    pub source: Option<String>,
}

impl CatalogEntry {
    /// Entry without a playable source
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            display_name: name.into(),
            is_playable_file: false,
            source: None,
        }
    }

    /// Entry backed by a playable file
    pub fn file(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            display_name: name.into(),
            is_playable_file: true,
            source: Some(source.into()),
        }
    }

    /// Locator to hand to the player, if this entry has its own
    pub fn playable_source(&self) -> Option<&str> {
        if self.is_playable_file {
            self.source.as_deref()
        } else {
            None
        }
    }
}

fn year_marker() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"^(.+?\(\d{4}\)).*$").expect("static pattern"))
}

/// Cut a file name after its `(YYYY)` year marker.
///
/// Names without a marker are returned unchanged.
pub fn clean_title(file_name: &str) -> String {
    year_marker().replace(file_name, "$1").into_owned()
}

/// Produces the ordered catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load every entry, in display order
    async fn load(&self) -> Result<Vec<CatalogEntry>>;
}

/// Built-in demo titles
#[derive(Debug, Clone, Default)]
pub struct MockCatalog;

impl MockCatalog {
    pub const TITLES: [&'static str; 19] = [
        "Avatar",
        "Avengers",
        "Fight Club",
        "Forrest Gump",
        "Gladiator",
        "Inception",
        "Interstellar",
        "Jurassic Park",
        "Le Roi Lion",
        "Little Jafna",
        "Matrix",
        "Nemo",
        "Pulp Fiction",
        "Star Wars",
        "The Dark Knight",
        "The Lord of the Rings",
        "Titanic",
        "Toy Story",
        "WALL-E",
    ];

    pub fn entries() -> Vec<CatalogEntry> {
        Self::TITLES
            .iter()
            .map(|title| CatalogEntry::placeholder(*title))
            .collect()
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn load(&self) -> Result<Vec<CatalogEntry>> {
        Ok(Self::entries())
    }
}

/// Media files found in one folder
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CatalogSource for DirectoryCatalog {
    async fn load(&self) -> Result<Vec<CatalogEntry>> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            Error::Catalog(format!("cannot open {}: {}", self.root.display(), e))
        })?;

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_file() {
                continue;
            }

            let name = item.file_name().to_string_lossy().into_owned();
            if name.is_empty() {
                continue;
            }

            let path = tokio::fs::canonicalize(item.path()).await?;
            let locator = Url::from_file_path(&path)
                .map_err(|_| Error::Catalog(format!("not an absolute path: {}", path.display())))?;

            entries.push(CatalogEntry::file(clean_title(&name), locator.to_string()));
        }

        entries.sort_by_key(|entry| entry.display_name.to_lowercase());
        info!(root = %self.root.display(), titles = entries.len(), "Catalog loaded");

        Ok(entries)
    }
}

/// Load from `source`, falling back to the demo titles when it fails
pub async fn load_catalog_or_mock(source: &dyn CatalogSource) -> Vec<CatalogEntry> {
    match source.load().await {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, code = e.error_code(), "Catalog source failed, using demo titles");
            MockCatalog::entries()
        }
    }
}
