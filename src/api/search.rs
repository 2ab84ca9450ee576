use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::AppError;
use crate::rendering::links::page_link;
use crate::rendering::markup::html_to_text;
use crate::rendering::snippet::context_summary;
use crate::sync::service::SyncService;

/// Length of the highlighted excerpt shown for each result.
pub const SNIPPET_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// A single entry of the results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: String,
    pub link: String,
    /// Highlighted excerpt; contains markup.
    pub snippet: String,
    pub last_edited: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query_string: String,
    pub matches: u64,
    /// `None` when nothing matched.
    pub results: Option<Vec<SearchResultItem>>,
}

/// Run a query and resolve hits back to pages.
///
/// Hits whose document id does not name an existing page are dropped.
pub async fn process_search(service: &SyncService, query: &str) -> Result<SearchResponse, AppError> {
    let query_string = html_to_text(query);
    if query_string.is_empty() {
        return Ok(SearchResponse {
            query_string,
            matches: 0,
            results: None,
        });
    }

    let found = service.search(&query_string, None, None).await?;
    if found.matches == 0 {
        return Ok(SearchResponse {
            query_string,
            matches: 0,
            results: None,
        });
    }

    let mut results = Vec::with_capacity(found.results.len());
    for hit in &found.results {
        let Ok(id) = hit.docid.parse::<i64>() else {
            tracing::debug!(docid = %hit.docid, "Skipping hit with non-numeric id");
            continue;
        };
        let Some(page) = service.pages().find_by_id(id).await? else {
            tracing::debug!(docid = %hit.docid, "Skipping hit for unknown page");
            continue;
        };

        let text = service.discover(&page).await?;
        results.push(SearchResultItem {
            link: page_link(service.pages(), &page).await?,
            snippet: context_summary(&text, &query_string, SNIPPET_LENGTH),
            title: page.title,
            last_edited: page.last_edited,
        });
    }

    Ok(SearchResponse {
        query_string,
        matches: found.matches,
        results: Some(results),
    })
}

/// Axum handler for `GET /search?q=...`.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = process_search(&state.sync, &params.q).await?;
    Ok(Json(response))
}
