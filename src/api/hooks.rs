use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::db::models::{Page, PageId};
use crate::error::AppError;
use crate::hooks::{on_after_publish, on_after_unpublish};
use crate::sync::service::{SyncOutcome, SyncService};

/// Response header carrying the end-user toast, percent-encoded.
pub const STATUS_HEADER: HeaderName = HeaderName::from_static("x-status");
pub const TOAST_PREFIX: &str = "Searchify: ";

#[derive(Debug, Serialize, Deserialize)]
pub struct HookResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl From<SyncOutcome> for HookResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.toast,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub indexed: usize,
}

/// Headers for a toast, empty when there is nothing to show.
pub fn toast_headers(toast: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(toast) = toast {
        let encoded = urlencoding::encode(&format!("{TOAST_PREFIX}{toast}")).into_owned();
        if let Ok(value) = HeaderValue::from_str(&encoded) {
            headers.insert(STATUS_HEADER, value);
        }
    }
    headers
}

async fn load_page(service: &SyncService, id: PageId) -> Result<Page, AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest(format!("Invalid page id {id}")));
    }
    service
        .pages()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No page with id {id}")))
}

/// Publish hook logic, separated from the HTTP layer for testability.
pub async fn process_publish(service: &SyncService, id: PageId) -> Result<SyncOutcome, AppError> {
    let mut page = load_page(service, id).await?;
    on_after_publish(service, &mut page).await
}

pub async fn process_unpublish(
    service: &SyncService,
    id: PageId,
) -> Result<SyncOutcome, AppError> {
    let mut page = load_page(service, id).await?;
    on_after_unpublish(service, &mut page).await
}

fn respond(outcome: SyncOutcome) -> (HeaderMap, Json<HookResponse>) {
    let headers = toast_headers(outcome.toast.as_deref());
    (headers, Json(outcome.into()))
}

/// Axum handler for `POST /hooks/publish/{id}`.
pub async fn publish_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<(HeaderMap, Json<HookResponse>), AppError> {
    let outcome = process_publish(&state.sync, id).await?;
    Ok(respond(outcome))
}

/// Axum handler for `POST /hooks/unpublish/{id}`.
pub async fn unpublish_handler(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<(HeaderMap, Json<HookResponse>), AppError> {
    let outcome = process_unpublish(&state.sync, id).await?;
    Ok(respond(outcome))
}

/// Axum handler for `POST /admin/reindex`.
pub async fn reindex_handler(
    State(state): State<AppState>,
) -> Result<Json<ReindexResponse>, AppError> {
    let indexed = state.sync.index_all().await?;
    Ok(Json(ReindexResponse { indexed }))
}
