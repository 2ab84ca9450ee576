#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{TimeZone, Utc};

use searchify::app::{router, AppState};
use searchify::config::{ReadinessSettings, Settings};
use searchify::db::models::{CanViewType, Page, PageId, PageSchema, SiteConfig};
use searchify::db::repository::PageRepository;
use searchify::db::schema_repository::PageTypeRepository;
use searchify::db::settings_repository::SiteConfigRepository;
use searchify::error::AppError;
use searchify::search::client::{
    ApiStatus, IndexApi, IndexDocument, IndexHandle, IndexMetadata, IndexOptions, SearchHit,
    SearchRequest, SearchResults,
};
use searchify::sync::service::SyncService;

pub const INDEX_NAME: &str = "site-pages";

// -- In-memory repositories --

#[derive(Default)]
pub struct MemoryPages {
    pub pages: Mutex<HashMap<PageId, Page>>,
}

#[async_trait]
impl PageRepository for MemoryPages {
    async fn find_by_id(&self, id: PageId) -> Result<Option<Page>, AppError> {
        Ok(self.pages.lock().unwrap().get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Page>, AppError> {
        let mut pages: Vec<Page> = self.pages.lock().unwrap().values().cloned().collect();
        pages.sort_by_key(|p| p.id);
        Ok(pages)
    }

    async fn save(&self, page: &Page) -> Result<(), AppError> {
        self.pages.lock().unwrap().insert(page.id, page.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPageTypes {
    pub schemas: Mutex<HashMap<String, PageSchema>>,
}

#[async_trait]
impl PageTypeRepository for MemoryPageTypes {
    async fn field_schema(&self, class_name: &str) -> Result<Option<PageSchema>, AppError> {
        Ok(self.schemas.lock().unwrap().get(class_name).cloned())
    }

    async fn register(&self, schema: PageSchema) -> Result<(), AppError> {
        self.schemas
            .lock()
            .unwrap()
            .insert(schema.class_name.clone(), schema);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySite {
    pub config: Mutex<SiteConfig>,
}

#[async_trait]
impl SiteConfigRepository for MemorySite {
    async fn get_site_config(&self) -> Result<SiteConfig, AppError> {
        Ok(self.config.lock().unwrap().clone())
    }

    async fn set_can_view_type(&self, can_view_type: CanViewType) -> Result<(), AppError> {
        self.config.lock().unwrap().can_view_type = can_view_type;
        Ok(())
    }
}

// -- Fake remote index --

/// A remote index kept in memory. Search matches documents whose text or
/// title contains the query, case-insensitively.
pub struct FakeIndex {
    pub documents: Mutex<BTreeMap<String, IndexDocument>>,
    /// Status returned by every mutating call.
    pub status: Mutex<u16>,
    /// Hits appended to every non-empty search result.
    pub extra_hits: Mutex<Vec<SearchHit>>,
    pub searches: AtomicUsize,
}

impl FakeIndex {
    fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
            status: Mutex::new(200),
            extra_hits: Mutex::new(vec![]),
            searches: AtomicUsize::new(0),
        }
    }

    fn status(&self) -> ApiStatus {
        ApiStatus(*self.status.lock().unwrap())
    }

    pub fn contains(&self, docid: &str) -> bool {
        self.documents.lock().unwrap().contains_key(docid)
    }
}

#[async_trait]
impl IndexHandle for FakeIndex {
    fn name(&self) -> &str {
        INDEX_NAME
    }

    async fn has_started(&self) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn add_document(&self, doc: &IndexDocument) -> Result<ApiStatus, AppError> {
        let status = self.status();
        if status.is_success() {
            self.documents
                .lock()
                .unwrap()
                .insert(doc.docid.clone(), doc.clone());
        }
        Ok(status)
    }

    async fn add_documents(&self, docs: &[IndexDocument]) -> Result<ApiStatus, AppError> {
        let status = self.status();
        if status.is_success() {
            let mut documents = self.documents.lock().unwrap();
            for doc in docs {
                documents.insert(doc.docid.clone(), doc.clone());
            }
        }
        Ok(status)
    }

    async fn delete_document(&self, docid: &str) -> Result<ApiStatus, AppError> {
        let status = self.status();
        if status.is_success() {
            self.documents.lock().unwrap().remove(docid);
        }
        Ok(status)
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, AppError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let needle = request.query.to_lowercase();

        let mut results: Vec<SearchHit> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| {
                d.fields.text.to_lowercase().contains(&needle)
                    || d.fields.title.to_lowercase().contains(&needle)
            })
            .map(|d| SearchHit {
                docid: d.docid.clone(),
                fields: BTreeMap::from([(
                    "title".to_string(),
                    serde_json::json!(d.fields.title),
                )]),
            })
            .collect();

        if !results.is_empty() {
            results.extend(self.extra_hits.lock().unwrap().iter().cloned());
        }

        Ok(SearchResults {
            matches: results.len() as u64,
            results,
            search_time: None,
        })
    }
}

pub struct FakeIndexApi {
    pub index: Arc<FakeIndex>,
}

#[async_trait]
impl IndexApi for FakeIndexApi {
    async fn list_indexes(&self) -> Result<BTreeMap<String, IndexMetadata>, AppError> {
        Ok(BTreeMap::from([(
            INDEX_NAME.to_string(),
            IndexMetadata {
                started: true,
                ..IndexMetadata::default()
            },
        )]))
    }

    async fn create_index(
        &self,
        _name: &str,
        _options: IndexOptions,
    ) -> Result<Arc<dyn IndexHandle>, AppError> {
        Ok(self.index.clone())
    }

    fn get_index(&self, _name: &str) -> Arc<dyn IndexHandle> {
        self.index.clone()
    }
}

/// Holds in-memory services and provides the Axum router for integration tests.
pub struct TestEnv {
    pub router: Router,
    pub pages: Arc<MemoryPages>,
    pub page_types: Arc<MemoryPageTypes>,
    pub site: Arc<MemorySite>,
    pub index: Arc<FakeIndex>,
}

impl TestEnv {
    pub async fn start() -> Self {
        Self::with_settings(test_settings()).await
    }

    /// Build the router over a service connected with the given settings.
    pub async fn with_settings(settings: Settings) -> Self {
        let pages = Arc::new(MemoryPages::default());
        let page_types = Arc::new(MemoryPageTypes::default());
        let site = Arc::new(MemorySite::default());
        let index = Arc::new(FakeIndex::new());
        let api = Arc::new(FakeIndexApi {
            index: index.clone(),
        });

        let service = SyncService::connect(
            api,
            pages.clone(),
            page_types.clone(),
            site.clone(),
            settings,
        )
        .await
        .expect("Failed to connect sync service");

        Self {
            router: router(AppState::new(service)),
            pages,
            page_types,
            site,
            index,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    pub fn insert(&self, page: Page) {
        self.pages.pages.lock().unwrap().insert(page.id, page);
    }

    pub fn page(&self, id: PageId) -> Page {
        self.pages.pages.lock().unwrap()[&id].clone()
    }
}

pub fn test_settings() -> Settings {
    Settings {
        api_url: "http://:secret@localhost:9".to_string(),
        index: INDEX_NAME.to_string(),
        readiness: ReadinessSettings {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            max_attempts: 3,
        },
        ..Settings::default()
    }
}

/// A public top-level page.
pub fn page(id: PageId, title: &str, content: &str) -> Page {
    Page {
        id,
        class_name: "Page".to_string(),
        title: title.to_string(),
        content: content.to_string(),
        url_segment: title.to_lowercase().replace(' ', "-"),
        last_edited: Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap(),
        fields: BTreeMap::new(),
        can_view_type: CanViewType::Anyone,
        parent_id: 0,
        show_in_search: true,
        index_state: 0,
    }
}

/// Decode the toast carried by a hook response.
pub fn toast(response: &axum_test::TestResponse) -> Option<String> {
    let raw = response.headers().get("x-status")?.to_str().ok()?;
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}
