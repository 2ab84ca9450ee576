use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Options sent when creating a remote index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexOptions {
    pub public_search: bool,
}

/// Index description as returned by the index listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexMetadata {
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub public_search: Option<bool>,
}

/// Fields stored for each indexed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFields {
    /// Plain text extracted from the page.
    pub text: String,
    pub title: String,
    /// Last edit time, unix seconds.
    pub timestamp: String,
}

/// A document representation for the remote index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Primary key: the page id.
    pub docid: String,
    pub fields: DocumentFields,
}

/// HTTP status of a mutating index call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiStatus(pub u16);

impl ApiStatus {
    /// Only an exact 200 counts as success.
    pub fn is_success(&self) -> bool {
        self.0 == 200
    }
}

/// Query sent to the remote index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub start: Option<u32>,
    pub len: Option<u32>,
    pub scoring_function: Option<u32>,
    /// Fields to extract a relevant snippet from.
    pub snippet_fields: Vec<String>,
    /// Extra stored fields to return with each hit.
    pub fetch_fields: Vec<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            start: None,
            len: None,
            scoring_function: None,
            snippet_fields: vec![],
            fetch_fields: vec![],
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub docid: String,
    /// Snippets and fetched fields (`snippet_text`, `title`, `timestamp`, ...).
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Results of a query against the remote index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Total number of matching documents.
    pub matches: u64,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub search_time: Option<serde_json::Value>,
}

/// Account-level operations of the remote index API.
#[async_trait]
pub trait IndexApi: Send + Sync {
    /// All indexes on the account, keyed by name.
    async fn list_indexes(&self) -> Result<BTreeMap<String, IndexMetadata>, AppError>;

    /// Create a new index. It may need some time before it starts.
    async fn create_index(
        &self,
        name: &str,
        options: IndexOptions,
    ) -> Result<Arc<dyn IndexHandle>, AppError>;

    /// A handle to an existing index. Does not contact the server.
    fn get_index(&self, name: &str) -> Arc<dyn IndexHandle>;
}

/// Operations on one remote index.
#[async_trait]
pub trait IndexHandle: Send + Sync {
    fn name(&self) -> &str;

    async fn has_started(&self) -> Result<bool, AppError>;

    /// Add or replace a single document.
    async fn add_document(&self, doc: &IndexDocument) -> Result<ApiStatus, AppError>;

    /// Add or replace a batch of documents in one call.
    async fn add_documents(&self, docs: &[IndexDocument]) -> Result<ApiStatus, AppError>;

    async fn delete_document(&self, docid: &str) -> Result<ApiStatus, AppError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, AppError>;
}
