//! Core data types for the page hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved slug value marking the hierarchy root.
///
/// A parent carrying this slug terminates path compilation without
/// contributing a path segment.
pub const ROOT_SENTINEL: &str = ":mainpage:";

/// Store-assigned page identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a page record.
///
/// `Removed` is terminal and has no variant here: a removed page no longer
/// exists in the store, so absence *is* the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
    /// Normal, resolvable (when published) page.
    Active,
    /// Soft-deleted; implicitly unpublished, restorable.
    Trashed,
}

impl PageState {
    /// Returns `true` for [`PageState::Trashed`].
    #[must_use]
    pub const fn is_trashed(self) -> bool {
        matches!(self, Self::Trashed)
    }
}

/// A content page addressable by its compiled URL path.
///
/// Pages form a rooted forest via `parent_id`. `slug_compiled` is derived
/// from the page's slug and its ancestor chain on every save; it is a cache,
/// not a source of truth, and goes stale if an ancestor's slug changes
/// without this page being re-saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Assigned by the store on first persist, immutable thereafter.
    pub id: Option<PageId>,
    /// Parent page; `None` denotes a root.
    pub parent_id: Option<PageId>,
    /// Short path segment, assumed unique within its parent's scope.
    pub slug: String,
    /// When `true` this page is a subdomain root and compiles to an
    /// absolute URL instead of a path segment.
    pub slug_absolute: bool,
    /// Fully resolved path, recomputed on every save and used as the
    /// path-lookup key.
    pub slug_compiled: String,
    /// Only published pages resolve via path lookup.
    pub published: bool,
    /// Soft-delete state.
    pub state: PageState,
    /// Page title; required on save.
    pub title: String,
    /// Heading; defaults to `title` on save when empty.
    pub h1: String,
    /// Breadcrumb text; defaults to `title` on save when empty.
    pub breadcrumbs_label: String,
    /// Meta description, inert for this core.
    pub meta_description: String,
    /// Body content, inert for this core.
    pub content: String,
    /// Announce/teaser text, inert for this core.
    pub announce: String,
    /// Ordering among siblings, inert for this core.
    pub sort_order: i32,
    /// Whether external search may index the page, inert for this core.
    pub searchable: bool,
    /// Robots directive code, inert for this core.
    pub robots: i32,
    /// Set once on first save.
    pub date_added: Option<DateTime<Utc>>,
    /// Set on every save.
    pub date_modified: Option<DateTime<Utc>>,
}

impl Page {
    /// Creates a new unsaved page with the given slug and title.
    #[must_use]
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            parent_id: None,
            slug: slug.into(),
            slug_absolute: false,
            slug_compiled: String::new(),
            published: true,
            state: PageState::Active,
            title: title.into(),
            h1: String::new(),
            breadcrumbs_label: String::new(),
            meta_description: String::new(),
            content: String::new(),
            announce: String::new(),
            sort_order: 0,
            searchable: true,
            robots: 0,
            date_added: None,
            date_modified: None,
        }
    }

    /// Sets the parent id, builder-style.
    #[must_use]
    pub const fn with_parent(mut self, parent: PageId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Marks the page as an absolute subdomain root, builder-style.
    #[must_use]
    pub const fn absolute(mut self) -> Self {
        self.slug_absolute = true;
        self
    }

    /// Returns `true` when this page carries the root sentinel slug.
    #[must_use]
    pub fn is_root_sentinel(&self) -> bool {
        self.slug == ROOT_SENTINEL
    }
}

/// Outcome of a single `delete` invocation on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The page was moved to the trash (soft delete); a second delete will
    /// remove it physically.
    SoftDeleted,
    /// The page was physically removed from the store.
    Removed,
}

/// Cacheable result of a page lookup.
///
/// Negative results are first-class so that repeated misses on unmapped
/// URLs are bounded by a short TTL rather than hitting the store each time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PageLookup {
    /// The lookup matched a page.
    Found(Page),
    /// The lookup definitively matched nothing.
    Missing,
}

impl PageLookup {
    /// Converts into the underlying page, if any.
    #[must_use]
    pub fn into_page(self) -> Option<Page> {
        match self {
            Self::Found(page) => Some(page),
            Self::Missing => None,
        }
    }
}
