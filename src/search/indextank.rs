use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::error::AppError;
use crate::search::client::{
    ApiStatus, IndexApi, IndexDocument, IndexHandle, IndexMetadata, IndexOptions, SearchRequest,
    SearchResults,
};

/// Basic-auth credentials lifted out of the API URL.
#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: Option<String>,
}

impl Credentials {
    fn apply(creds: &Option<Credentials>, request: RequestBuilder) -> RequestBuilder {
        match creds {
            Some(c) => request.basic_auth(&c.username, c.password.as_deref()),
            None => request,
        }
    }
}

/// Indextank-compatible HTTP implementation of [`IndexApi`].
pub struct IndextankClient {
    http: Client,
    base: Url,
    credentials: Option<Credentials>,
}

impl IndextankClient {
    /// Build a client from the private API URL, e.g. `http://:secret@abc.api.searchify.com`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut base = Url::parse(api_url)
            .map_err(|e| AppError::Config(format!("Invalid api_url '{api_url}': {e}")))?;

        if base.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "api_url '{api_url}' cannot be used as a base URL"
            )));
        }

        let credentials = if base.username().is_empty() && base.password().is_none() {
            None
        } else {
            Some(Credentials {
                username: base.username().to_string(),
                password: base.password().map(str::to_string),
            })
        };
        // Both setters only fail for cannot-be-a-base URLs, rejected above.
        let _ = base.set_username("");
        let _ = base.set_password(None);

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base, segments)
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn remote_error(context: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::Remote(format!("{context} failed with status {status}: {body}"))
}

#[async_trait]
impl IndexApi for IndextankClient {
    async fn list_indexes(&self) -> Result<BTreeMap<String, IndexMetadata>, AppError> {
        let request = self.http.get(self.endpoint(&["v1", "indexes"]));
        let response = Credentials::apply(&self.credentials, request).send().await?;

        if !response.status().is_success() {
            return Err(remote_error("Listing indexes", response).await);
        }

        Ok(response.json().await?)
    }

    async fn create_index(
        &self,
        name: &str,
        options: IndexOptions,
    ) -> Result<Arc<dyn IndexHandle>, AppError> {
        let request = self
            .http
            .put(self.endpoint(&["v1", "indexes", name]))
            .json(&options);
        let response = Credentials::apply(&self.credentials, request).send().await?;

        // 201 = created, 204 = already existed
        if !response.status().is_success() {
            return Err(remote_error(&format!("Creating index {name}"), response).await);
        }

        tracing::info!(index = name, "Created remote index");
        Ok(self.get_index(name))
    }

    fn get_index(&self, name: &str) -> Arc<dyn IndexHandle> {
        Arc::new(IndextankIndex {
            http: self.http.clone(),
            url: self.endpoint(&["v1", "indexes", name]),
            name: name.to_string(),
            credentials: self.credentials.clone(),
        })
    }
}

/// A single remote index.
pub struct IndextankIndex {
    http: Client,
    url: Url,
    name: String,
    credentials: Option<Credentials>,
}

impl IndextankIndex {
    fn docs_url(&self) -> Url {
        endpoint(&self.url, &["docs"])
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, AppError> {
        Ok(Credentials::apply(&self.credentials, request).send().await?)
    }
}

#[async_trait]
impl IndexHandle for IndextankIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn has_started(&self) -> Result<bool, AppError> {
        let response = self.send(self.http.get(self.url.clone())).await?;

        if !response.status().is_success() {
            return Err(remote_error(&format!("Reading index {}", self.name), response).await);
        }

        let metadata: IndexMetadata = response.json().await?;
        Ok(metadata.started)
    }

    async fn add_document(&self, doc: &IndexDocument) -> Result<ApiStatus, AppError> {
        let response = self.send(self.http.put(self.docs_url()).json(doc)).await?;
        Ok(ApiStatus(response.status().as_u16()))
    }

    async fn add_documents(&self, docs: &[IndexDocument]) -> Result<ApiStatus, AppError> {
        let response = self.send(self.http.put(self.docs_url()).json(docs)).await?;
        Ok(ApiStatus(response.status().as_u16()))
    }

    async fn delete_document(&self, docid: &str) -> Result<ApiStatus, AppError> {
        let request = self.http.delete(self.docs_url()).query(&[("docid", docid)]);
        let response = self.send(request).await?;
        Ok(ApiStatus(response.status().as_u16()))
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, AppError> {
        let mut params: Vec<(&str, String)> = vec![("q", request.query.clone())];
        if let Some(start) = request.start {
            params.push(("start", start.to_string()));
        }
        if let Some(len) = request.len {
            params.push(("len", len.to_string()));
        }
        if let Some(function) = request.scoring_function {
            params.push(("function", function.to_string()));
        }
        if !request.snippet_fields.is_empty() {
            params.push(("snippet", request.snippet_fields.join(",")));
        }
        if !request.fetch_fields.is_empty() {
            params.push(("fetch", request.fetch_fields.join(",")));
        }

        let url = endpoint(&self.url, &["search"]);
        let response = self.send(self.http.get(url).query(&params)).await?;

        if !ApiStatus(response.status().as_u16()).is_success() {
            return Err(remote_error(&format!("Searching index {}", self.name), response).await);
        }

        Ok(response.json().await?)
    }
}
