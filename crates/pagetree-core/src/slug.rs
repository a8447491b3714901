//! Slug compilation: deriving a page's routable path from its ancestors.
//!
//! [`compile_slug`] is pure over a preloaded [`PageArena`]; it reads the
//! ancestor chain from the arena and performs no store access. Three things
//! terminate the upward walk:
//!
//! - a page with no parent (a root),
//! - the [`ROOT_SENTINEL`] slug, which contributes no segment,
//! - an ancestor with `slug_absolute` set, which becomes an absolute
//!   subdomain prefix (`scheme://slug.server/`) for everything below it.
//!
//! A page that is itself `slug_absolute` compiles to the absolute URL form
//! directly, with a trailing slash. Absolute ancestor prefixes carry no
//! trailing slash; the join supplies the separator.

use crate::hierarchy::{PageArena, MAX_DEPTH};
use crate::{Error, Page, Result};

/// Compiles the full routable path for `page`.
///
/// `scheme` and `server_name` are only consulted for absolute slugs. The
/// ancestor chain must already be loaded into `arena` (see
/// [`PageArena::load_ancestors`]); a chain longer than [`MAX_DEPTH`] fails
/// with [`Error::CyclicHierarchy`].
pub fn compile_slug(
    page: &Page,
    arena: &PageArena,
    scheme: &str,
    server_name: &str,
) -> Result<String> {
    if page.slug_absolute {
        return Ok(format!("{scheme}://{}.{server_name}/", page.slug));
    }

    let mut parts = vec![page.slug.clone()];
    let mut current = arena.parent_of(page);
    let mut depth = 0usize;
    while let Some(parent) = current {
        depth += 1;
        if depth > MAX_DEPTH {
            return Err(Error::CyclicHierarchy {
                id: page.id.map_or(0, |id| id.0),
                depth,
            });
        }
        if parent.is_root_sentinel() {
            break;
        }
        if parent.slug_absolute {
            // No trailing slash here: the reverse-join below supplies the
            // separator between the subdomain root and the path.
            parts.push(format!("{scheme}://{}.{server_name}", parent.slug));
            break;
        }
        parts.push(parent.slug.clone());
        current = arena.parent_of(parent);
    }

    parts.reverse();
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PageId, ROOT_SENTINEL};
    use proptest::prelude::*;

    fn stored(id: u64, parent: Option<u64>, slug: &str) -> Page {
        let mut page = Page::new(slug, slug);
        page.id = Some(PageId(id));
        page.parent_id = parent.map(PageId);
        page
    }

    fn arena_of(pages: Vec<Page>) -> PageArena {
        let mut arena = PageArena::new();
        for page in pages {
            arena.insert(page);
        }
        arena
    }

    #[test]
    fn root_sentinel_contributes_no_segment() {
        // :mainpage: -> about -> team compiles without the sentinel.
        let arena = arena_of(vec![
            stored(1, None, ROOT_SENTINEL),
            stored(2, Some(1), "about"),
            stored(3, Some(2), "team"),
        ]);
        let team = arena.get(PageId(3)).unwrap().clone();
        assert_eq!(compile_slug(&team, &arena, "http", "example.com").unwrap(), "about/team");
    }

    #[test]
    fn parentless_page_compiles_to_own_slug() {
        let arena = arena_of(vec![stored(1, None, "standalone")]);
        let page = arena.get(PageId(1)).unwrap().clone();
        assert_eq!(compile_slug(&page, &arena, "http", "example.com").unwrap(), "standalone");
    }

    #[test]
    fn absolute_page_becomes_subdomain_url() {
        let mut page = stored(1, None, "blog");
        page.slug_absolute = true;
        let arena = arena_of(vec![page.clone()]);
        assert_eq!(
            compile_slug(&page, &arena, "http", "example.com").unwrap(),
            "http://blog.example.com/"
        );
    }

    #[test]
    fn absolute_ancestor_prefixes_without_trailing_slash() {
        let mut blog = stored(1, None, "blog");
        blog.slug_absolute = true;
        let arena = arena_of(vec![blog, stored(2, Some(1), "2024"), stored(3, Some(2), "hello")]);
        let post = arena.get(PageId(3)).unwrap().clone();
        assert_eq!(
            compile_slug(&post, &arena, "https", "example.com").unwrap(),
            "https://blog.example.com/2024/hello"
        );
    }

    #[test]
    fn walk_stops_at_absolute_ancestor() {
        // Anything above the absolute ancestor must be ignored.
        let mut hub = stored(2, Some(1), "hub");
        hub.slug_absolute = true;
        let arena = arena_of(vec![stored(1, None, "ignored"), hub, stored(3, Some(2), "leaf")]);
        let leaf = arena.get(PageId(3)).unwrap().clone();
        assert_eq!(
            compile_slug(&leaf, &arena, "http", "example.com").unwrap(),
            "http://hub.example.com/leaf"
        );
    }

    #[test]
    fn cyclic_arena_fails_instead_of_hanging() {
        let arena = arena_of(vec![stored(1, Some(2), "a"), stored(2, Some(1), "b")]);
        let a = arena.get(PageId(1)).unwrap().clone();
        let err = compile_slug(&a, &arena, "http", "example.com").unwrap_err();
        assert!(matches!(err, Error::CyclicHierarchy { id: 1, .. }));
    }

    proptest! {
        /// For non-absolute chains without the sentinel, compilation is the
        /// reverse-join of the slugs from root to page.
        #[test]
        fn compiles_to_reverse_join(slugs in prop::collection::vec("[a-z][a-z0-9-]{0,7}", 1..10)) {
            // slugs[0] is the page itself, the rest are ancestors bottom-up.
            let mut pages = Vec::new();
            for (i, slug) in slugs.iter().enumerate() {
                let id = i as u64 + 1;
                let parent = if i + 1 < slugs.len() { Some(id + 1) } else { None };
                pages.push(stored(id, parent, slug));
            }
            let arena = arena_of(pages);
            let page = arena.get(PageId(1)).unwrap().clone();

            let mut expected: Vec<String> = slugs.clone();
            expected.reverse();
            prop_assert_eq!(
                compile_slug(&page, &arena, "http", "example.com").unwrap(),
                expected.join("/")
            );
        }
    }
}
