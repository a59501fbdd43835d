//! Document-management REST API client.
//!
//! Token-authenticated reqwest client for the small slice of the document
//! API this system needs: document content, paginated name listings for
//! tags/correspondents/document types, thumbnail bytes, and the metadata
//! PATCH that writes analysis results back.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use tagmill_core::{defaults, AnalysisResult, Error, Result};

/// Configuration for the document API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the document-management API.
    pub base_url: String,
    /// API token sent as `Authorization: Token ...`.
    pub token: String,
    /// Page size for listing endpoints.
    pub page_size: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl ApiConfig {
    /// Create a configuration with default paging and timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            page_size: defaults::API_PAGE_SIZE,
            timeout_seconds: defaults::API_TIMEOUT_SECS,
        }
    }
}

/// One page of a listing endpoint.
#[derive(Debug, Deserialize)]
struct Page {
    results: Vec<NamedItem>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DocumentPayload {
    #[serde(default)]
    content: String,
}

/// Token-authenticated client for the document-management API.
pub struct DocumentApiClient {
    client: Client,
    config: ApiConfig,
}

impl DocumentApiClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config(
                "Document API base URL is not configured".to_string(),
            ));
        }
        if config.token.is_empty() {
            return Err(Error::Config(
                "Document API token is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Token {}", self.config.token))
    }

    /// Fetch the extracted text content of a document.
    pub async fn document_content(&self, document_id: &str) -> Result<String> {
        let url = self.url(&format!("/api/documents/{}/", document_id));
        let response = self.request(Method::GET, &url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "Document fetch returned {} for id {}",
                response.status(),
                document_id
            )));
        }

        let payload: DocumentPayload = response.json().await?;
        Ok(payload.content)
    }

    /// All existing tag names.
    pub async fn tag_names(&self) -> Result<Vec<String>> {
        self.paginated_names("/api/tags/").await
    }

    /// All existing correspondent names.
    pub async fn correspondent_names(&self) -> Result<Vec<String>> {
        self.paginated_names("/api/correspondents/").await
    }

    /// All existing document-type names.
    pub async fn document_type_names(&self) -> Result<Vec<String>> {
        self.paginated_names("/api/document_types/").await
    }

    /// Page through a listing endpoint collecting names.
    async fn paginated_names(&self, path: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut url = format!(
            "{}?page=1&page_size={}",
            self.url(path),
            self.config.page_size
        );

        loop {
            let response = self.request(Method::GET, &url).send().await?;
            if !response.status().is_success() {
                return Err(Error::Request(format!(
                    "Listing {} returned {}",
                    path,
                    response.status()
                )));
            }

            let page: Page = response.json().await?;
            names.extend(page.results.into_iter().map(|item| item.name));

            match page.next {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(
            subsystem = "client",
            component = "api",
            path = path,
            count = names.len(),
            "Fetched name listing"
        );
        Ok(names)
    }

    /// Fetch thumbnail bytes for a document. Returns `None` when the
    /// document has no thumbnail (404).
    pub async fn thumbnail(&self, document_id: &str) -> Result<Option<Vec<u8>>> {
        let url = self.url(&format!("/api/documents/{}/thumb/", document_id));
        let response = self.request(Method::GET, &url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(
                subsystem = "client",
                component = "api",
                document_id = %document_id,
                "No thumbnail for document"
            );
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "Thumbnail fetch returned {} for id {}",
                response.status(),
                document_id
            )));
        }

        let bytes = response.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    /// Write enriched metadata back to a document. Only fields the analysis
    /// produced are sent; nulls are left out of the PATCH body.
    pub async fn update_document(&self, document_id: &str, result: &AnalysisResult) -> Result<()> {
        let mut body = serde_json::Map::new();
        if let Some(title) = &result.title {
            body.insert("title".to_string(), title.clone().into());
        }
        if let Some(correspondent) = &result.correspondent {
            body.insert("correspondent".to_string(), correspondent.clone().into());
        }
        if !result.tags.is_empty() {
            body.insert("tags".to_string(), result.tags.clone().into());
        }
        if let Some(doc_type) = &result.document_type {
            body.insert("document_type".to_string(), doc_type.clone().into());
        }
        if let Some(date) = &result.document_date {
            body.insert("created_date".to_string(), date.clone().into());
        }
        if let Some(fields) = &result.custom_fields {
            body.insert(
                "custom_fields".to_string(),
                serde_json::Value::Object(fields.clone()),
            );
        }
        if body.is_empty() {
            warn!(
                subsystem = "client",
                component = "api",
                document_id = %document_id,
                "Nothing to write back, skipping PATCH"
            );
            return Ok(());
        }

        let url = self.url(&format!("/api/documents/{}/", document_id));
        let response = self
            .request(Method::PATCH, &url)
            .json(&serde_json::Value::Object(body))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "Metadata update returned {} for id {}",
                response.status(),
                document_id
            )));
        }
        Ok(())
    }
}
