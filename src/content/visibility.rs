use std::collections::HashSet;

use crate::db::models::{CanViewType, Page};
use crate::db::repository::PageRepository;
use crate::db::settings_repository::SiteConfigRepository;
use crate::error::AppError;

/// Upper bound on the number of parents followed from any page.
pub const MAX_ANCESTOR_DEPTH: usize = 64;

/// Blacklist check for a page type.
///
/// Returns `true` only when a non-empty blacklist is configured and the type
/// is *not* listed in it. An unset or empty blacklist, or a listed type,
/// yields `false`. Callers rely on this exact polarity.
///
/// An explicitly configured `[]` counts as unset and yields `false`, where a
/// plain "is a list configured" check would yield `true`.
pub fn is_blacklisted(blacklist: Option<&[String]>, page_type: &str) -> bool {
    match blacklist {
        Some(list) if !list.is_empty() => !list.iter().any(|t| t == page_type),
        _ => false,
    }
}

/// Resolve the top-level ancestor of a page.
///
/// Returns `None` when the parent chain is cyclic or deeper than
/// [`MAX_ANCESTOR_DEPTH`]. A parent id that no longer resolves ends the walk
/// at the last page found.
pub async fn top_level_parent(
    pages: &dyn PageRepository,
    page: &Page,
) -> Result<Option<Page>, AppError> {
    let mut current = page.clone();
    let mut visited = HashSet::from([current.id]);

    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some(parent_id) = current.parent() else {
            return Ok(Some(current));
        };

        if !visited.insert(parent_id) {
            tracing::warn!(page = page.id, parent = parent_id, "Cycle in page hierarchy");
            return Ok(None);
        }

        match pages.find_by_id(parent_id).await? {
            Some(parent) => current = parent,
            None => {
                tracing::debug!(page = current.id, parent = parent_id, "Dangling parent reference");
                return Ok(Some(current));
            }
        }
    }

    tracing::warn!(page = page.id, "Page hierarchy exceeds maximum depth");
    Ok(None)
}

/// Determine whether a page is publicly visible.
///
/// Pages restricted to logged-in or listed users never are. Otherwise the
/// root ancestor decides when it grants `Anyone`, and the site-wide setting
/// decides in every other case.
pub async fn is_publishable(
    pages: &dyn PageRepository,
    site: &dyn SiteConfigRepository,
    page: &Page,
) -> Result<bool, AppError> {
    if page.can_view_type.is_restricted() {
        return Ok(false);
    }

    if let Some(top) = top_level_parent(pages, page).await? {
        if top.can_view_type == CanViewType::Anyone {
            return Ok(true);
        }
    }

    let site_config = site.get_site_config().await?;
    Ok(site_config.can_view_type == CanViewType::Anyone)
}
