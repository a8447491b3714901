//! Filesystem-backed page store.
//!
//! Persists each page as a JSON document under `<root>/pages/<id>.json`.
//! Writes land in a `.tmp` sibling first and are renamed into place, so a
//! concurrent reader or a crash mid-write never observes a torn document.
//! Intended for small hierarchies (the same assumption the cache layer
//! makes): child and path lookups scan the directory rather than keeping a
//! secondary index.
//!
//! Root directory resolution order:
//!
//! 1. `PAGETREE_DATA_DIR` environment variable
//! 2. the platform data directory via `directories::ProjectDirs`

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::store::PageStore;
use crate::{Error, Page, PageId, Result};

/// Page store writing JSON documents to the local filesystem.
pub struct FsPageStore {
    pages_dir: PathBuf,
    // Serializes id assignment and writes; reads go unguarded.
    write_lock: Mutex<()>,
}

impl FsPageStore {
    /// Creates a store at the default root directory.
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var("PAGETREE_DATA_DIR") {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Self::with_root(PathBuf::from(trimmed));
            }
        }

        let dirs = ProjectDirs::from("", "", "pagetree")
            .ok_or_else(|| Error::Store("Failed to determine data directory".into()))?;
        Self::with_root(dirs.data_dir().to_path_buf())
    }

    /// Creates a store rooted at an explicit directory.
    pub fn with_root(root_dir: PathBuf) -> Result<Self> {
        let pages_dir = root_dir.join("pages");
        fs::create_dir_all(&pages_dir)
            .map_err(|e| Error::Store(format!("Failed to create pages directory: {e}")))?;
        Ok(Self {
            pages_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the page documents.
    #[must_use]
    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    fn page_path(&self, id: PageId) -> PathBuf {
        self.pages_dir.join(format!("{id}.json"))
    }

    fn load_page(path: &Path) -> Result<Page> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Store(format!("Failed to read page file: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Store(format!("Failed to parse page file: {e}")))
    }

    fn load_all(&self) -> Result<Vec<Page>> {
        let entries = fs::read_dir(&self.pages_dir)
            .map_err(|e| Error::Store(format!("Failed to read pages directory: {e}")))?;

        let mut pages = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::Store(format!("Failed to read directory entry: {e}")))?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            // A single unreadable document must not sink every scan; skip it
            // and keep the rest of the store usable.
            match Self::load_page(&path) {
                Ok(page) => pages.push(page),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable page file");
                },
            }
        }
        Ok(pages)
    }

    fn max_stored_id(&self) -> Result<u64> {
        let entries = fs::read_dir(&self.pages_dir)
            .map_err(|e| Error::Store(format!("Failed to read pages directory: {e}")))?;

        let mut max = 0u64;
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::Store(format!("Failed to read directory entry: {e}")))?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = stem.parse::<u64>() {
                    max = max.max(id);
                }
            }
        }
        Ok(max)
    }
}

#[async_trait]
impl PageStore for FsPageStore {
    async fn find_by_id(&self, id: PageId) -> Result<Option<Page>> {
        let path = self.page_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_page(&path).map(Some)
    }

    async fn find_children(&self, parent: PageId) -> Result<Vec<Page>> {
        let mut children: Vec<Page> = self
            .load_all()?
            .into_iter()
            .filter(|p| p.parent_id == Some(parent))
            .collect();
        children.sort_by_key(|p| (p.sort_order, p.id));
        Ok(children)
    }

    async fn find_by_compiled_slug(
        &self,
        path: &str,
        published_only: bool,
    ) -> Result<Option<Page>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|p| p.slug_compiled == path && (!published_only || p.published)))
    }

    async fn persist(&self, mut page: Page) -> Result<Page> {
        let _guard = self.write_lock.lock().await;

        let id = match page.id {
            Some(id) => id,
            None => {
                let id = PageId(self.max_stored_id()? + 1);
                page.id = Some(id);
                id
            },
        };

        let json = serde_json::to_string_pretty(&page)
            .map_err(|e| Error::Store(format!("Failed to serialize page: {e}")))?;
        let path = self.page_path(id);

        // Write to a temp file first to ensure atomicity
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &json)
            .map_err(|e| Error::Store(format!("Failed to write temp page file: {e}")))?;

        // Atomically rename temp file to final path (handle Windows overwrite)
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Store(format!("Failed to remove existing page file: {e}")))?;
        }
        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Store(format!("Failed to persist page file: {e}")))?;

        debug!(%id, slug = %page.slug, "persisted page");
        Ok(page)
    }

    async fn remove(&self, id: PageId) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let path = self.page_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Store(format!("Failed to remove page file: {e}")))?;
            debug!(%id, "removed page file");
        }
        Ok(())
    }
}
