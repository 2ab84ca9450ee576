//! Exercises the HTTP client against a fake Indextank server bound to an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use searchify::error::AppError;
use searchify::search::client::{
    DocumentFields, IndexApi, IndexDocument, IndexHandle, IndexOptions, SearchRequest,
};
use searchify::search::indextank::IndextankClient;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: HashMap<String, String>,
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeServer {
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// Status answered to document calls.
    docs_status: Arc<Mutex<u16>>,
}

impl FakeServer {
    fn record(
        &self,
        method: &str,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        self.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path,
            query,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
    }

    fn last(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

async fn list_indexes(State(s): State<FakeServer>, headers: HeaderMap) -> Json<Value> {
    s.record("GET", "/v1/indexes".into(), HashMap::new(), &headers, None);
    Json(json!({
        "site-pages": {"started": true, "code": "abc", "size": 12, "public_search": true}
    }))
}

async fn create_index(
    State(s): State<FakeServer>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    s.record("PUT", format!("/v1/indexes/{name}"), HashMap::new(), &headers, Some(body));
    StatusCode::CREATED
}

async fn index_info(
    State(s): State<FakeServer>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    s.record("GET", format!("/v1/indexes/{name}"), HashMap::new(), &headers, None);
    match name.as_str() {
        "starting" => Ok(Json(json!({"started": false}))),
        "missing" => Err(StatusCode::NOT_FOUND),
        _ => Ok(Json(json!({"started": true}))),
    }
}

async fn put_docs(
    State(s): State<FakeServer>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    s.record("PUT", format!("/v1/indexes/{name}/docs"), HashMap::new(), &headers, Some(body));
    StatusCode::from_u16(*s.docs_status.lock().unwrap()).unwrap()
}

async fn delete_docs(
    State(s): State<FakeServer>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> StatusCode {
    s.record("DELETE", format!("/v1/indexes/{name}/docs"), query, &headers, None);
    StatusCode::from_u16(*s.docs_status.lock().unwrap()).unwrap()
}

async fn search(
    State(s): State<FakeServer>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    s.record("GET", format!("/v1/indexes/{name}/search"), query, &headers, None);
    if name == "broken" {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({
        "matches": 1,
        "search_time": "0.002",
        "results": [{"docid": "4", "title": "Pricing", "snippet_text": "our <b>plans</b>"}]
    })))
}

async fn start() -> (FakeServer, String) {
    let state = FakeServer {
        docs_status: Arc::new(Mutex::new(200)),
        ..FakeServer::default()
    };

    let app = Router::new()
        .route("/v1/indexes", get(list_indexes))
        .route("/v1/indexes/{name}", get(index_info).put(create_index))
        .route("/v1/indexes/{name}/docs", put(put_docs).delete(delete_docs))
        .route("/v1/indexes/{name}/search", get(search))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake server");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (state, format!("http://:s3cret@{addr}"))
}

fn client(url: &str) -> IndextankClient {
    IndextankClient::new(url, Duration::from_secs(5)).expect("Failed to build client")
}

fn document(docid: &str) -> IndexDocument {
    IndexDocument {
        docid: docid.to_string(),
        fields: DocumentFields {
            text: "Plans for every team".to_string(),
            title: "Pricing".to_string(),
            timestamp: "1710408600".to_string(),
        },
    }
}

#[tokio::test]
async fn lists_indexes_with_basic_auth() {
    let (server, url) = start().await;

    let indexes = client(&url).list_indexes().await.unwrap();

    assert!(indexes["site-pages"].started);
    assert_eq!(indexes["site-pages"].size, Some(12));
    // base64(":s3cret")
    assert_eq!(
        server.last().authorization.as_deref(),
        Some("Basic OnMzY3JldA==")
    );
}

#[tokio::test]
async fn creates_index_with_public_search() {
    let (server, url) = start().await;

    let index = client(&url)
        .create_index(
            "fresh",
            IndexOptions {
                public_search: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(index.name(), "fresh");
    let request = server.last();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/v1/indexes/fresh");
    assert_eq!(request.body, Some(json!({"public_search": true})));
}

#[tokio::test]
async fn reports_started_flag() {
    let (_server, url) = start().await;
    let api = client(&url);

    assert!(api.get_index("site-pages").has_started().await.unwrap());
    assert!(!api.get_index("starting").has_started().await.unwrap());
    assert!(matches!(
        api.get_index("missing").has_started().await,
        Err(AppError::Remote(_))
    ));
}

#[tokio::test]
async fn adds_documents_and_passes_status_through() {
    let (server, url) = start().await;
    let index = client(&url).get_index("site-pages");

    let status = index.add_document(&document("4")).await.unwrap();
    assert!(status.is_success());
    let request = server.last();
    assert_eq!(request.path, "/v1/indexes/site-pages/docs");
    assert_eq!(
        request.body.unwrap(),
        json!({"docid": "4", "fields": {
            "text": "Plans for every team", "title": "Pricing", "timestamp": "1710408600"
        }})
    );

    let status = index
        .add_documents(&[document("4"), document("5")])
        .await
        .unwrap();
    assert!(status.is_success());
    assert_eq!(server.last().body.unwrap().as_array().unwrap().len(), 2);

    *server.docs_status.lock().unwrap() = 409;
    let status = index.add_document(&document("4")).await.unwrap();
    assert_eq!(status.0, 409);
    assert!(!status.is_success());
}

#[tokio::test]
async fn deletes_by_docid() {
    let (server, url) = start().await;
    let index = client(&url).get_index("site-pages");

    let status = index.delete_document("9").await.unwrap();

    assert!(status.is_success());
    let request = server.last();
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.query.get("docid").map(String::as_str), Some("9"));
}

#[tokio::test]
async fn searches_with_snippet_and_fetch_fields() {
    let (server, url) = start().await;
    let index = client(&url).get_index("site-pages");

    let request = SearchRequest {
        snippet_fields: vec!["text".to_string()],
        fetch_fields: vec!["title".to_string(), "timestamp".to_string()],
        ..SearchRequest::new("plans")
    };
    let results = index.search(&request).await.unwrap();

    assert_eq!(results.matches, 1);
    assert_eq!(results.results[0].docid, "4");

    let recorded = server.last();
    assert_eq!(recorded.query.get("q").map(String::as_str), Some("plans"));
    assert_eq!(recorded.query.get("snippet").map(String::as_str), Some("text"));
    assert_eq!(
        recorded.query.get("fetch").map(String::as_str),
        Some("title,timestamp")
    );
    assert!(!recorded.query.contains_key("start"));
}

#[tokio::test]
async fn search_failure_is_remote_error() {
    let (_server, url) = start().await;
    let index = client(&url).get_index("broken");

    let result = index.search(&SearchRequest::new("plans")).await;
    assert!(matches!(result, Err(AppError::Remote(_))));
}

#[tokio::test]
async fn unreachable_server_is_remote_error() {
    let api = IndextankClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    assert!(matches!(api.list_indexes().await, Err(AppError::Remote(_))));
}
