use std::collections::HashSet;

use crate::content::visibility::MAX_ANCESTOR_DEPTH;
use crate::db::models::Page;
use crate::db::repository::PageRepository;
use crate::error::AppError;

/// Build the site-relative URL of a page from its ancestors' URL segments.
///
/// Top-level pages resolve to `/segment/`, nested pages to
/// `/parent/child/`. The walk stops at a missing parent, a repeated id or
/// after [`MAX_ANCESTOR_DEPTH`] hops; whatever was collected so far is used.
pub async fn page_link(pages: &dyn PageRepository, page: &Page) -> Result<String, AppError> {
    let mut segments = vec![page.url_segment.clone()];
    let mut visited = HashSet::from([page.id]);
    let mut parent_id = page.parent();

    while let Some(id) = parent_id {
        if segments.len() > MAX_ANCESTOR_DEPTH || !visited.insert(id) {
            break;
        }
        let Some(parent) = pages.find_by_id(id).await? else {
            break;
        };
        segments.push(parent.url_segment.clone());
        parent_id = parent.parent();
    }

    let path: Vec<&str> = segments
        .iter()
        .rev()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect();

    if path.is_empty() {
        return Ok("/".to_string());
    }
    Ok(format!("/{}/", path.join("/")))
}
