//! # pagetree-core
//!
//! Core engine for a hierarchy of content pages addressable by compiled URL
//! paths: slug compilation, cache-fronted resolution with tag-based
//! invalidation, and the cascading soft-delete/restore lifecycle.
//!
//! ## Architecture
//!
//! The crate is organized around a few collaborators:
//!
//! - **Page Store** ([`PageStore`]): durable source of truth for page
//!   records, with in-memory and filesystem implementations.
//! - **Slug Compiler** ([`compile_slug`]): pure derivation of a page's full
//!   routable path from its ancestor chain, loaded once per operation into a
//!   [`PageArena`].
//! - **Cache Layer** ([`TagCache`]): key-value cache with tag-based bulk
//!   invalidation fronting both id- and path-based lookups.
//! - **Lifecycle Manager** ([`PageService`]): orchestrates save, two-phase
//!   delete, restore, and the cache-fronted resolve operations.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pagetree_core::{MemoryPageStore, MemoryTagCache, Page, PageService, SiteConfig};
//!
//! # async fn demo() -> pagetree_core::Result<()> {
//! let service = PageService::new(
//!     Arc::new(MemoryPageStore::new()),
//!     Arc::new(MemoryTagCache::new()),
//!     SiteConfig::with_server_name("example.com"),
//! );
//!
//! let about = service.save(Page::new("about", "About us")).await?;
//! let resolved = service.resolve_by_path("about").await?;
//! assert_eq!(resolved.map(|p| p.id), Some(about.id));
//! # Ok(())
//! # }
//! ```
//!
//! ## Consistency model
//!
//! `slug_compiled` is recomputed on every save and persisted; it goes stale
//! if an ancestor's slug changes without the descendant being re-saved — a
//! documented limitation, not silently corrected. Cached lookups all share
//! one tag, so any page mutation clears every page entry; readers re-fetch
//! rather than assume monotonic cache freshness. Cache unavailability
//! degrades reads to store fallthrough and never fails writes.

/// Tag-aware cache trait, in-memory implementation, key/TTL scheme
pub mod cache;
/// Site configuration (scheme, server name) with TOML and env loading
pub mod config;
/// Error types and result alias
pub mod error;
/// Per-operation page arenas with bounded traversal
pub mod hierarchy;
/// Page lifecycle orchestration: save, delete, restore, resolve
pub mod service;
/// Pure slug compilation over an ancestor arena
pub mod slug;
/// Filesystem-backed page store
pub mod storage;
/// Page store trait and in-memory implementation
pub mod store;
/// Core data types
pub mod types;

// Re-export commonly used types
pub use cache::{MemoryTagCache, TagCache, FOUND_TTL, MISS_TTL, PAGE_COMMON_TAG};
pub use config::SiteConfig;
pub use error::{Error, Result};
pub use hierarchy::{PageArena, MAX_DEPTH};
pub use service::{OpScope, PageService};
pub use slug::compile_slug;
pub use storage::FsPageStore;
pub use store::{MemoryPageStore, PageStore};
pub use types::*;
