use std::sync::{Arc, RwLock};

use backon::{ExponentialBuilder, Retryable};

use crate::config::Settings;
use crate::content::discovery::discover;
use crate::content::visibility;
use crate::db::models::Page;
use crate::db::repository::PageRepository;
use crate::db::schema_repository::PageTypeRepository;
use crate::db::settings_repository::SiteConfigRepository;
use crate::error::AppError;
use crate::search::client::{
    DocumentFields, IndexApi, IndexDocument, IndexHandle, IndexOptions, SearchRequest,
    SearchResults,
};

pub const MSG_INDEX_UPDATED: &str = "Your searchify index has been updated.";
pub const MSG_ERROR_ADDING: &str = "There was an error adding this document";
pub const MSG_ERROR_REMOVING: &str = "There was an error removing this document";
pub const MSG_REMOVED: &str = "This document has been removed from the index as a result of \
     Show In Search being disabled, or is not publicly visible";

/// Result of a mutating sync operation.
///
/// Remote failures are not errors: they come back as `success = false` with
/// a toast explaining what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    /// Short status message for the end user.
    pub toast: Option<String>,
}

impl SyncOutcome {
    fn skipped() -> Self {
        Self {
            success: false,
            toast: None,
        }
    }

    fn succeeded(message: &str) -> Self {
        Self {
            success: true,
            toast: Some(message.to_string()),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            toast: Some(message.into()),
        }
    }
}

/// Where the service stands with respect to its remote index.
#[derive(Clone)]
pub enum IndexState {
    Unselected,
    Selecting,
    Ready(Arc<dyn IndexHandle>),
}

enum Poll {
    NotStarted,
    Failed(AppError),
}

/// Keeps the remote index in sync with the site tree.
pub struct SyncService {
    client: Arc<dyn IndexApi>,
    pages: Arc<dyn PageRepository>,
    page_types: Arc<dyn PageTypeRepository>,
    site: Arc<dyn SiteConfigRepository>,
    settings: Settings,
    state: RwLock<IndexState>,
}

impl SyncService {
    /// Create a service with no index selected yet.
    pub fn new(
        client: Arc<dyn IndexApi>,
        pages: Arc<dyn PageRepository>,
        page_types: Arc<dyn PageTypeRepository>,
        site: Arc<dyn SiteConfigRepository>,
        settings: Settings,
    ) -> Self {
        Self {
            client,
            pages,
            page_types,
            site,
            settings,
            state: RwLock::new(IndexState::Unselected),
        }
    }

    /// Create a service and select the configured index.
    pub async fn connect(
        client: Arc<dyn IndexApi>,
        pages: Arc<dyn PageRepository>,
        page_types: Arc<dyn PageTypeRepository>,
        site: Arc<dyn SiteConfigRepository>,
        settings: Settings,
    ) -> Result<Self, AppError> {
        settings.validate()?;
        let index = settings.index.clone();
        let service = Self::new(client, pages, page_types, site, settings);
        service.select_index(&index).await?;
        Ok(service)
    }

    pub fn pages(&self) -> &dyn PageRepository {
        self.pages.as_ref()
    }

    pub fn state(&self) -> IndexState {
        self.state
            .read()
            .map(|s| s.clone())
            .unwrap_or(IndexState::Unselected)
    }

    fn set_state(&self, state: IndexState) {
        if let Ok(mut guard) = self.state.write() {
            *guard = state;
        }
    }

    /// The selected index; document operations fail without one.
    pub fn index(&self) -> Result<Arc<dyn IndexHandle>, AppError> {
        match self.state() {
            IndexState::Ready(index) => Ok(index),
            _ => Err(AppError::IndexNotSelected),
        }
    }

    /// Bind the service to the named index, creating it when allowed.
    ///
    /// A freshly created index is polled until it reports itself started;
    /// the service only becomes ready afterwards.
    pub async fn select_index(&self, name: &str) -> Result<(), AppError> {
        self.set_state(IndexState::Selecting);

        match self.provision(name).await {
            Ok(index) => {
                tracing::info!(index = name, "Index selected");
                self.set_state(IndexState::Ready(index));
                Ok(())
            }
            Err(e) => {
                self.set_state(IndexState::Unselected);
                Err(e)
            }
        }
    }

    async fn provision(&self, name: &str) -> Result<Arc<dyn IndexHandle>, AppError> {
        let indexes = self.client.list_indexes().await?;
        if indexes.contains_key(name) {
            return Ok(self.client.get_index(name));
        }

        if !self.settings.make_index {
            return Err(AppError::IndexMissing(name.to_string()));
        }

        let index = self
            .client
            .create_index(
                name,
                IndexOptions {
                    public_search: true,
                },
            )
            .await?;

        self.wait_until_started(index.as_ref()).await?;
        Ok(index)
    }

    async fn wait_until_started(&self, index: &dyn IndexHandle) -> Result<(), AppError> {
        let readiness = &self.settings.readiness;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(readiness.initial_delay())
            .with_max_delay(readiness.max_delay())
            .with_max_times(readiness.max_attempts.saturating_sub(1));

        let check = move || async move {
            match index.has_started().await {
                Ok(true) => Ok(()),
                Ok(false) => Err(Poll::NotStarted),
                Err(e) => Err(Poll::Failed(e)),
            }
        };

        check
            .retry(backoff)
            .when(|e| matches!(e, Poll::NotStarted))
            .notify(|_, delay| {
                tracing::debug!(index = index.name(), ?delay, "Index not started yet");
            })
            .await
            .map_err(|e| match e {
                Poll::NotStarted => AppError::IndexStartTimeout {
                    index: index.name().to_string(),
                    attempts: readiness.max_attempts,
                },
                Poll::Failed(e) => e,
            })
    }

    /// Blacklist check against the configured `page_blacklist`.
    pub fn is_blacklisted(&self, page_type: &str) -> bool {
        visibility::is_blacklisted(self.settings.page_blacklist.as_deref(), page_type)
    }

    pub async fn is_publishable(&self, page: &Page) -> Result<bool, AppError> {
        visibility::is_publishable(self.pages.as_ref(), self.site.as_ref(), page).await
    }

    /// Plain text of a page as it is sent to the index.
    pub async fn discover(&self, page: &Page) -> Result<String, AppError> {
        let schema = if self.settings.discover {
            self.page_types.field_schema(&page.class_name).await?
        } else {
            None
        };
        Ok(discover(page, schema.as_ref(), self.settings.discover))
    }

    async fn build_document(&self, page: &Page) -> Result<IndexDocument, AppError> {
        Ok(IndexDocument {
            docid: page.id.to_string(),
            fields: DocumentFields {
                text: self.discover(page).await?,
                title: page.title.clone(),
                timestamp: page.last_edited.timestamp().to_string(),
            },
        })
    }

    /// Add a single page to the index and mark it as indexed.
    pub async fn add_one(&self, page: &mut Page) -> Result<SyncOutcome, AppError> {
        let index = self.index()?;

        // e.g. you wouldn't want to index an ErrorPage
        if self.is_blacklisted(&page.class_name) {
            return Ok(SyncOutcome::skipped());
        }

        let doc = self.build_document(page).await?;

        match index.add_document(&doc).await {
            Ok(status) if status.is_success() => {}
            Ok(status) => {
                tracing::warn!(page = page.id, status = status.0, "{MSG_ERROR_ADDING}");
                return Ok(SyncOutcome::failed(MSG_ERROR_ADDING));
            }
            Err(e) => {
                tracing::warn!(page = page.id, "Failed to add document: {e}");
                return Ok(SyncOutcome::failed(e.to_string()));
            }
        }

        if !page.is_indexed() {
            page.index_state = 1;
            self.pages.save(page).await?;
        }

        tracing::info!(page = page.id, index = index.name(), "Page indexed");
        Ok(SyncOutcome::succeeded(MSG_INDEX_UPDATED))
    }

    /// Add a batch of pages with a single remote call.
    ///
    /// On success every page of the input is flagged as indexed, including
    /// blacklisted pages that were left out of the batch.
    pub async fn add_many(&self, pages: &mut [Page]) -> Result<SyncOutcome, AppError> {
        if pages.is_empty() {
            return Ok(SyncOutcome::skipped());
        }

        let index = self.index()?;

        let mut docs = Vec::with_capacity(pages.len());
        for page in pages.iter() {
            if self.is_blacklisted(&page.class_name) {
                continue;
            }
            docs.push(self.build_document(page).await?);
        }

        match index.add_documents(&docs).await {
            Ok(status) if status.is_success() => {}
            Ok(status) => {
                tracing::warn!(count = docs.len(), status = status.0, "{MSG_ERROR_ADDING}");
                return Ok(SyncOutcome::failed(MSG_ERROR_ADDING));
            }
            Err(e) => {
                tracing::warn!(count = docs.len(), "Failed to add documents: {e}");
                return Ok(SyncOutcome::failed(e.to_string()));
            }
        }

        for page in pages.iter_mut() {
            if !page.is_indexed() {
                page.index_state = 1;
                self.pages.save(page).await?;
            }
        }

        tracing::info!(count = docs.len(), index = index.name(), "Pages indexed");
        Ok(SyncOutcome::succeeded(MSG_INDEX_UPDATED))
    }

    /// Remove a single page from the index and clear its indexed flag.
    pub async fn remove_one(&self, page: &mut Page) -> Result<SyncOutcome, AppError> {
        let index = self.index()?;

        match index.delete_document(&page.id.to_string()).await {
            Ok(status) if status.is_success() => {}
            Ok(status) => {
                tracing::warn!(page = page.id, status = status.0, "{MSG_ERROR_REMOVING}");
                return Ok(SyncOutcome::failed(MSG_ERROR_REMOVING));
            }
            Err(e) => {
                tracing::warn!(page = page.id, "Failed to remove document: {e}");
                return Ok(SyncOutcome::failed(e.to_string()));
            }
        }

        if page.is_indexed() {
            page.index_state = 0;
            self.pages.save(page).await?;
        }

        tracing::info!(page = page.id, index = index.name(), "Page removed from index");
        Ok(SyncOutcome::succeeded(MSG_REMOVED))
    }

    /// Query the selected index.
    ///
    /// Snippets default to `text`; fetched fields default to `title` and `timestamp`.
    pub async fn search(
        &self,
        query: &str,
        snippet_fields: Option<&[String]>,
        fetch_fields: Option<&[String]>,
    ) -> Result<SearchResults, AppError> {
        let index = self.index()?;

        let snippet_fields = match snippet_fields {
            Some(fields) if !fields.is_empty() => fields.to_vec(),
            _ => vec!["text".to_string()],
        };
        let fetch_fields = match fetch_fields {
            Some(fields) if !fields.is_empty() => fields.to_vec(),
            _ => vec!["title".to_string(), "timestamp".to_string()],
        };

        let request = SearchRequest {
            snippet_fields,
            fetch_fields,
            ..SearchRequest::new(query)
        };

        index.search(&request).await
    }

    /// Index every publicly visible page, one call per page.
    ///
    /// Returns the number of pages successfully added.
    pub async fn index_all(&self) -> Result<usize, AppError> {
        let pages = self.pages.list_all().await?;
        if pages.is_empty() {
            return Err(AppError::NotFound("No pages were found for indexing".into()));
        }

        let mut indexed = 0;
        for mut page in pages {
            if !self.is_publishable(&page).await? {
                continue;
            }
            if self.add_one(&mut page).await?.success {
                indexed += 1;
            }
        }

        tracing::info!(indexed, "Reindex finished");
        Ok(indexed)
    }
}
