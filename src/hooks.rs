//! Reactions to page lifecycle events.

use crate::db::models::Page;
use crate::error::AppError;
use crate::sync::service::{SyncOutcome, SyncService};

/// Called after a page is published.
///
/// The page is (re)indexed when it is searchable and publicly visible, and
/// removed from the index otherwise.
pub async fn on_after_publish(
    service: &SyncService,
    page: &mut Page,
) -> Result<SyncOutcome, AppError> {
    if page.show_in_search && service.is_publishable(page).await? {
        service.add_one(page).await
    } else {
        tracing::debug!(page = page.id, "Page not searchable, removing from index");
        service.remove_one(page).await
    }
}

/// Called after a page is unpublished.
pub async fn on_after_unpublish(
    service: &SyncService,
    page: &mut Page,
) -> Result<SyncOutcome, AppError> {
    service.remove_one(page).await
}
