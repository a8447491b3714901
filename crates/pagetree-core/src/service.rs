//! Page lifecycle orchestration: save, delete, restore, resolve.
//!
//! [`PageService`] coordinates the slug compiler, the cache layer, and the
//! page store so that compiled paths and cached lookups never observably
//! diverge from the store beyond the declared TTL window. It holds no locks
//! across its multi-step operations; the store is the only synchronization
//! point between concurrent callers, and every step that touches hierarchy
//! works on an arena loaded once for that call.
//!
//! Cache failures never abort persistence: a failed read degrades to a miss
//! and falls through to the store, a failed write or invalidation is logged
//! and the operation proceeds. Store failures propagate unmodified.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cache::{id_key, path_key, TagCache, FOUND_TTL, MISS_TTL, PAGE_COMMON_TAG};
use crate::hierarchy::PageArena;
use crate::slug::compile_slug;
use crate::store::PageStore;
use crate::{DeleteOutcome, Error, Page, PageId, PageLookup, PageState, Result, SiteConfig};

/// Per-operation identity map for id lookups.
///
/// Memoizes `page:<id>:<flag>` results within one logical operation to
/// avoid redundant cache round-trips. A scope must never outlive the
/// operation that created it; it is a convenience on top of the shared
/// cache, not a substitute for its invalidation.
#[derive(Debug, Default)]
pub struct OpScope {
    by_id: HashMap<(PageId, bool), PageLookup>,
}

impl OpScope {
    /// Creates an empty scope for one logical operation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Orchestrates page mutation and cache-fronted resolution.
pub struct PageService {
    store: Arc<dyn PageStore>,
    cache: Arc<dyn TagCache>,
    config: SiteConfig,
    fallback_host: String,
}

impl PageService {
    /// Creates a service over the given collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn PageStore>, cache: Arc<dyn TagCache>, config: SiteConfig) -> Self {
        Self {
            store,
            cache,
            config,
            fallback_host: "localhost".to_string(),
        }
    }

    /// Sets the host used for absolute URLs when the config has no
    /// `server_name` (typically derived from the current request).
    #[must_use]
    pub fn with_fallback_host(mut self, host: impl Into<String>) -> Self {
        self.fallback_host = host.into();
        self
    }

    /// Validates, recompiles the slug, invalidates page caches, and
    /// persists.
    ///
    /// Steps, in order: required-field validation (surfaced before any cache
    /// effect or write), timestamp stamping, slug compilation over freshly
    /// loaded ancestors, forced unpublish for trashed pages, `h1` and
    /// breadcrumb defaults, tag invalidation, persist.
    pub async fn save(&self, mut page: Page) -> Result<Page> {
        if page.slug.trim().is_empty() {
            return Err(Error::Validation("slug is required".into()));
        }
        if page.title.trim().is_empty() {
            return Err(Error::Validation("title is required".into()));
        }

        let now = Utc::now();
        if page.date_added.is_none() {
            page.date_added = Some(now);
        }
        page.date_modified = Some(now);

        let arena = PageArena::load_ancestors(self.store.as_ref(), &page).await?;
        let host = self.config.server_name_or(&self.fallback_host);
        page.slug_compiled = compile_slug(&page, &arena, &self.config.scheme, host)?;

        if page.state.is_trashed() {
            page.published = false;
        }
        if page.breadcrumbs_label.trim().is_empty() {
            page.breadcrumbs_label = page.title.clone();
        }
        if page.h1.trim().is_empty() {
            page.h1 = page.title.clone();
        }

        // Invalidate before the write becomes visible so readers cannot
        // observe the old cached value once the new one is durable.
        self.invalidate_page_entries().await;
        let saved = self.store.persist(page).await?;
        debug!(
            id = ?saved.id,
            path = %saved.slug_compiled,
            "saved page"
        );
        Ok(saved)
    }

    /// Two-phase, cascading delete.
    ///
    /// Loads the subtree once and walks it post-order, so children always
    /// transition before their parent. Each node moves one step through the
    /// state machine per call: `Active` pages are trashed (soft delete via
    /// [`save`](Self::save)), already-trashed pages are physically removed.
    /// The returned outcome is the root page's transition; a missing root is
    /// reported as already [`DeleteOutcome::Removed`].
    pub async fn delete(&self, id: PageId) -> Result<DeleteOutcome> {
        let arena = PageArena::load_subtree(self.store.as_ref(), id).await?;
        if arena.is_empty() {
            debug!(%id, "delete of absent page treated as removed");
            return Ok(DeleteOutcome::Removed);
        }

        let mut outcome = DeleteOutcome::Removed;
        for node_id in arena.post_order(id) {
            let Some(page) = arena.get(node_id) else {
                continue;
            };
            let node_outcome = if page.state.is_trashed() {
                self.store.remove(node_id).await?;
                self.invalidate_page_entries().await;
                info!(id = %node_id, slug = %page.slug, "removed page");
                DeleteOutcome::Removed
            } else {
                let mut trashed = page.clone();
                trashed.state = PageState::Trashed;
                trashed.published = false;
                self.save(trashed).await?;
                info!(id = %node_id, slug = %page.slug, "soft-deleted page");
                DeleteOutcome::SoftDeleted
            };
            if node_id == id {
                outcome = node_outcome;
            }
        }
        Ok(outcome)
    }

    /// Brings a trashed page back: `Trashed → Active`, then save.
    ///
    /// Children stay trashed; restoring a subtree is an explicit per-node
    /// operation. `published` is taken from the supplied page, so the caller
    /// decides whether the restored page goes live immediately.
    pub async fn restore(&self, mut page: Page) -> Result<Page> {
        page.state = PageState::Active;
        self.save(page).await
    }

    /// Resolves a published page by its compiled path.
    ///
    /// Cache-fronted; negative results are cached with the shorter miss TTL.
    /// `Ok(None)` is a normal negative result, not a failure.
    pub async fn resolve_by_path(&self, path: &str) -> Result<Option<Page>> {
        let key = path_key(path);
        if let Some(lookup) = self.cache_get(&key).await {
            return Ok(lookup.into_page());
        }

        let found = self.store.find_by_compiled_slug(path, true).await?;
        let (lookup, ttl) = match found {
            Some(page) => (PageLookup::Found(page), FOUND_TTL),
            None => (PageLookup::Missing, MISS_TTL),
        };
        self.cache_set(&key, lookup.clone(), ttl).await;
        Ok(lookup.into_page())
    }

    /// Resolves a page by id and published flag, with a fresh [`OpScope`].
    pub async fn resolve_by_id(&self, id: PageId, published: bool) -> Result<Option<Page>> {
        let mut scope = OpScope::new();
        self.resolve_by_id_scoped(&mut scope, id, published).await
    }

    /// Resolves a page by id within an existing operation scope.
    ///
    /// The scope memoizes results for the duration of one logical operation;
    /// repeated lookups for the same `(id, published)` pair hit neither the
    /// cache nor the store.
    pub async fn resolve_by_id_scoped(
        &self,
        scope: &mut OpScope,
        id: PageId,
        published: bool,
    ) -> Result<Option<Page>> {
        if let Some(lookup) = scope.by_id.get(&(id, published)) {
            return Ok(lookup.clone().into_page());
        }

        let key = id_key(id, published);
        let lookup = if let Some(cached) = self.cache_get(&key).await {
            cached
        } else {
            let found = self
                .store
                .find_by_id(id)
                .await?
                .filter(|p| p.published == published);
            let lookup = found.map_or(PageLookup::Missing, PageLookup::Found);
            self.cache_set(&key, lookup.clone(), FOUND_TTL).await;
            lookup
        };

        scope.by_id.insert((id, published), lookup.clone());
        Ok(lookup.into_page())
    }

    async fn cache_get(&self, key: &str) -> Option<PageLookup> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, key, "cache read failed; treating as miss");
                None
            },
        }
    }

    async fn cache_set(&self, key: &str, value: PageLookup, ttl: Duration) {
        if let Err(e) = self.cache.set(key, value, ttl, &[PAGE_COMMON_TAG]).await {
            warn!(error = %e, key, "cache write failed; lookup will not be memoized");
        }
    }

    async fn invalidate_page_entries(&self) {
        if let Err(e) = self.cache.invalidate(&[PAGE_COMMON_TAG]).await {
            warn!(
                error = %e,
                "cache invalidation failed; stale entries persist until TTL expiry"
            );
        }
    }
}
