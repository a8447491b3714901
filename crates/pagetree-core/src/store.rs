//! Page store collaborator: the durable source of truth for page records.
//!
//! The lifecycle manager is written against the [`PageStore`] trait only.
//! [`MemoryPageStore`] is the in-process implementation used in tests and
//! fakes; [`crate::storage::FsPageStore`] persists to the local filesystem.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Page, PageId, Result};

/// Durable record storage for pages, keyed by id.
///
/// Implementations must tolerate concurrent callers; this trait is the only
/// synchronization point between overlapping lifecycle operations.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fetches a page by id, regardless of published state.
    async fn find_by_id(&self, id: PageId) -> Result<Option<Page>>;

    /// Fetches the direct children of a page, ordered by sort order then id.
    async fn find_children(&self, parent: PageId) -> Result<Vec<Page>>;

    /// Fetches a page by its compiled slug, optionally restricted to
    /// published pages.
    async fn find_by_compiled_slug(
        &self,
        path: &str,
        published_only: bool,
    ) -> Result<Option<Page>>;

    /// Inserts or updates a page, assigning an id on first persist. Returns
    /// the stored record.
    async fn persist(&self, page: Page) -> Result<Page>;

    /// Removes a page record. Removing an absent id is a no-op.
    async fn remove(&self, id: PageId) -> Result<()>;
}

/// In-memory page store backed by a `HashMap`.
#[derive(Debug)]
pub struct MemoryPageStore {
    pages: RwLock<HashMap<PageId, Page>>,
    next_id: AtomicU64,
}

impl Default for MemoryPageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    /// Returns `true` when the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn find_by_id(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.pages.read().await.get(&id).cloned())
    }

    async fn find_children(&self, parent: PageId) -> Result<Vec<Page>> {
        let pages = self.pages.read().await;
        let mut children: Vec<Page> = pages
            .values()
            .filter(|p| p.parent_id == Some(parent))
            .cloned()
            .collect();
        children.sort_by_key(|p| (p.sort_order, p.id));
        Ok(children)
    }

    async fn find_by_compiled_slug(
        &self,
        path: &str,
        published_only: bool,
    ) -> Result<Option<Page>> {
        let pages = self.pages.read().await;
        Ok(pages
            .values()
            .find(|p| p.slug_compiled == path && (!published_only || p.published))
            .cloned())
    }

    async fn persist(&self, mut page: Page) -> Result<Page> {
        let id = match page.id {
            Some(id) => id,
            None => {
                let id = PageId(self.next_id.fetch_add(1, Ordering::Relaxed));
                page.id = Some(id);
                id
            },
        };
        self.pages.write().await.insert(id, page.clone());
        Ok(page)
    }

    async fn remove(&self, id: PageId) -> Result<()> {
        // Absent ids are tolerated: concurrent deletes may race to remove
        // the same record.
        self.pages.write().await.remove(&id);
        Ok(())
    }
}
