use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("host API error: {0}")]
    Api(String),
    #[error("item {0} not found")]
    NotFound(String),
}

/// Library record for an imported item.
#[derive(Debug, Clone, Deserialize)]
pub struct HostItem {
    pub id: String,
    pub name: String,
}

/// Capability interface over the host application's library (allows mocking for tests).
///
/// The host owns all persistence and indexing; this system only appends items
/// and reads them back.
#[async_trait]
pub trait HostLibrary: Send + Sync {
    /// Add the file at `path` as a new library item; returns the host-assigned id.
    async fn add_item_from_path(
        &self,
        path: &Path,
        name: &str,
        tags: &[String],
        folders: &[String],
    ) -> Result<String, HostError>;

    /// Fetch the full item record by id.
    async fn get_item_by_id(&self, item_id: &str) -> Result<HostItem, HostError>;

    /// Attach a custom thumbnail to an existing item.
    async fn set_item_thumbnail(&self, item_id: &str, thumbnail: &Path) -> Result<(), HostError>;

    /// Root path of the host library on disk.
    async fn library_path(&self) -> Result<PathBuf, HostError>;
}

/// Envelope every host API response is wrapped in.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    status: String,
    #[serde(default)]
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_data(self) -> Result<T, HostError> {
        if self.status != "success" {
            return Err(HostError::Api(format!(
                "host returned status {:?}",
                self.status
            )));
        }
        self.data
            .ok_or_else(|| HostError::Api("response carried no data".to_string()))
    }

    fn ok(self) -> Result<(), HostError> {
        if self.status == "success" {
            Ok(())
        } else {
            Err(HostError::Api(format!(
                "host returned status {:?}",
                self.status
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct LibraryInfo {
    path: PathBuf,
}

/// Production client for the host's local web API.
pub struct HttpHost {
    client: Client,
    base_url: String,
}

impl HttpHost {
    pub fn new(base_url: impl Into<String>) -> Result<Self, HostError> {
        let client = Client::builder().user_agent("lode/0.1").build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl HostLibrary for HttpHost {
    async fn add_item_from_path(
        &self,
        path: &Path,
        name: &str,
        tags: &[String],
        folders: &[String],
    ) -> Result<String, HostError> {
        let body = json!({
            "path": path,
            "name": name,
            "tags": tags,
            "folders": folders,
        });

        let response = self
            .client
            .post(self.url("/item/addFromPath"))
            .json(&body)
            .send()
            .await?;

        let envelope: ApiResponse<String> = response.json().await?;
        envelope.into_data()
    }

    async fn get_item_by_id(&self, item_id: &str) -> Result<HostItem, HostError> {
        let response = self
            .client
            .get(self.url("/item/info"))
            .query(&[("id", item_id)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HostError::NotFound(item_id.to_string()));
        }

        let envelope: ApiResponse<HostItem> = response.json().await?;
        envelope.into_data()
    }

    async fn set_item_thumbnail(&self, item_id: &str, thumbnail: &Path) -> Result<(), HostError> {
        let body = json!({
            "id": item_id,
            "path": thumbnail,
        });

        let response = self
            .client
            .post(self.url("/item/setThumbnail"))
            .json(&body)
            .send()
            .await?;

        let envelope: ApiResponse<serde_json::Value> = response.json().await?;
        envelope.ok()
    }

    async fn library_path(&self) -> Result<PathBuf, HostError> {
        let response = self.client.get(self.url("/library/info")).send().await?;
        let envelope: ApiResponse<LibraryInfo> = response.json().await?;
        Ok(envelope.into_data()?.path)
    }
}
