//! Per-operation page arenas for bounded hierarchy traversal.
//!
//! Walking parent references lazily against the store makes cycle detection
//! and depth bounds awkward, so each lifecycle operation loads the pages it
//! needs into a [`PageArena`] up front: an id-indexed map plus a parent →
//! children adjacency list. Traversal then happens in memory with an
//! explicit depth counter, and a chain that exceeds [`MAX_DEPTH`] hops fails
//! with [`Error::CyclicHierarchy`] instead of looping.

use std::collections::{HashMap, VecDeque};

use crate::store::PageStore;
use crate::{Error, Page, PageId, Result};

/// Maximum ancestor/descendant chain length before the hierarchy is treated
/// as cyclic.
pub const MAX_DEPTH: usize = 64;

/// Pages loaded for one logical operation, indexed by id with parent →
/// children adjacency.
#[derive(Debug, Default)]
pub struct PageArena {
    pages: HashMap<PageId, Page>,
    children: HashMap<PageId, Vec<PageId>>,
}

impl PageArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page to the arena. Pages without an assigned id are ignored;
    /// only stored records participate in traversal.
    pub fn insert(&mut self, page: Page) {
        let Some(id) = page.id else { return };
        if let Some(parent_id) = page.parent_id {
            let siblings = self.children.entry(parent_id).or_default();
            if !siblings.contains(&id) {
                siblings.push(id);
            }
        }
        self.pages.insert(id, page);
    }

    /// Looks up a page by id.
    #[must_use]
    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.pages.get(&id)
    }

    /// Looks up the parent of a page, if both are present.
    #[must_use]
    pub fn parent_of(&self, page: &Page) -> Option<&Page> {
        page.parent_id.and_then(|pid| self.pages.get(&pid))
    }

    /// Direct children of a page, in load order.
    #[must_use]
    pub fn children_of(&self, id: PageId) -> &[PageId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Number of pages in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` when the arena holds no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Post-order traversal from `root`: every page appears after all of its
    /// descendants, so cascading operations process children first.
    #[must_use]
    pub fn post_order(&self, root: PageId) -> Vec<PageId> {
        let mut ordered = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                ordered.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.children_of(id) {
                stack.push((child, false));
            }
        }
        ordered
    }

    /// Loads `page` and its ancestor chain from the store.
    ///
    /// The walk stops at a page without a parent. Revisiting an id, or
    /// exceeding [`MAX_DEPTH`] hops, fails with [`Error::CyclicHierarchy`].
    pub async fn load_ancestors(store: &dyn PageStore, page: &Page) -> Result<Self> {
        let mut arena = Self::new();
        arena.insert(page.clone());

        let origin = page.id.map_or(0, |id| id.0);
        let mut next = page.parent_id;
        let mut depth = 0usize;
        while let Some(parent_id) = next {
            depth += 1;
            if depth > MAX_DEPTH || arena.pages.contains_key(&parent_id) {
                return Err(Error::CyclicHierarchy { id: origin, depth });
            }
            let Some(parent) = store.find_by_id(parent_id).await? else {
                // Dangling parent reference; treat the chain as ending here.
                break;
            };
            next = parent.parent_id;
            arena.insert(parent);
        }
        Ok(arena)
    }

    /// Loads the subtree rooted at `root_id` from the store, breadth-first.
    ///
    /// Depth is bounded by [`MAX_DEPTH`]; a child id that was already loaded
    /// fails with [`Error::CyclicHierarchy`].
    pub async fn load_subtree(store: &dyn PageStore, root_id: PageId) -> Result<Self> {
        let mut arena = Self::new();
        let Some(root) = store.find_by_id(root_id).await? else {
            return Ok(arena);
        };
        arena.insert(root);

        let mut frontier = VecDeque::from([(root_id, 0usize)]);
        while let Some((id, depth)) = frontier.pop_front() {
            if depth >= MAX_DEPTH {
                return Err(Error::CyclicHierarchy {
                    id: root_id.0,
                    depth,
                });
            }
            for child in store.find_children(id).await? {
                let Some(child_id) = child.id else { continue };
                if arena.pages.contains_key(&child_id) {
                    return Err(Error::CyclicHierarchy {
                        id: root_id.0,
                        depth: depth + 1,
                    });
                }
                arena.insert(child);
                frontier.push_back((child_id, depth + 1));
            }
        }
        Ok(arena)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPageStore;
    use crate::Page;

    fn stored(id: u64, parent: Option<u64>, slug: &str) -> Page {
        let mut page = Page::new(slug, slug);
        page.id = Some(PageId(id));
        page.parent_id = parent.map(PageId);
        page
    }

    async fn seeded_store(pages: Vec<Page>) -> MemoryPageStore {
        let store = MemoryPageStore::new();
        for page in pages {
            store.persist(page).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn load_ancestors_walks_to_root() {
        let store = seeded_store(vec![
            stored(1, None, "root"),
            stored(2, Some(1), "mid"),
            stored(3, Some(2), "leaf"),
        ])
        .await;

        let leaf = store.find_by_id(PageId(3)).await.unwrap().unwrap();
        let arena = PageArena::load_ancestors(&store, &leaf).await.unwrap();
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.parent_of(&leaf).unwrap().slug, "mid");
    }

    #[tokio::test]
    async fn load_ancestors_detects_cycle() {
        let store = seeded_store(vec![stored(1, Some(2), "a"), stored(2, Some(1), "b")]).await;

        let a = store.find_by_id(PageId(1)).await.unwrap().unwrap();
        let err = PageArena::load_ancestors(&store, &a).await.unwrap_err();
        assert!(matches!(err, Error::CyclicHierarchy { id: 1, .. }));
    }

    #[tokio::test]
    async fn load_ancestors_tolerates_dangling_parent() {
        let store = seeded_store(vec![stored(5, Some(99), "orphan")]).await;
        let orphan = store.find_by_id(PageId(5)).await.unwrap().unwrap();
        let arena = PageArena::load_ancestors(&store, &orphan).await.unwrap();
        assert_eq!(arena.len(), 1);
    }

    #[tokio::test]
    async fn load_subtree_collects_descendants() {
        let store = seeded_store(vec![
            stored(1, None, "root"),
            stored(2, Some(1), "a"),
            stored(3, Some(1), "b"),
            stored(4, Some(2), "a-child"),
        ])
        .await;

        let arena = PageArena::load_subtree(&store, PageId(1)).await.unwrap();
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.children_of(PageId(1)).len(), 2);
    }

    #[tokio::test]
    async fn load_subtree_stops_at_the_depth_bound() {
        // A chain one level deeper than the bound allows.
        let mut pages = Vec::new();
        for i in 1..=(MAX_DEPTH as u64 + 2) {
            let parent = (i > 1).then(|| i - 1);
            pages.push(stored(i, parent, "deep"));
        }
        let store = seeded_store(pages).await;

        let err = PageArena::load_subtree(&store, PageId(1)).await.unwrap_err();
        assert!(matches!(err, Error::CyclicHierarchy { id: 1, .. }));
    }

    #[tokio::test]
    async fn load_subtree_of_missing_root_is_empty() {
        let store = MemoryPageStore::new();
        let arena = PageArena::load_subtree(&store, PageId(9)).await.unwrap();
        assert!(arena.is_empty());
    }

    #[tokio::test]
    async fn post_order_puts_children_before_parents() {
        let store = seeded_store(vec![
            stored(1, None, "root"),
            stored(2, Some(1), "a"),
            stored(3, Some(2), "a-child"),
            stored(4, Some(1), "b"),
        ])
        .await;

        let arena = PageArena::load_subtree(&store, PageId(1)).await.unwrap();
        let order = arena.post_order(PageId(1));

        let pos = |id: u64| order.iter().position(|&p| p == PageId(id)).unwrap();
        assert!(pos(3) < pos(2));
        assert!(pos(2) < pos(1));
        assert!(pos(4) < pos(1));
        assert_eq!(order.last(), Some(&PageId(1)));
    }
}
