//! HTTP-based storage implementation.
//!
//! Talks to the remote cloud save service:
//! ```text
//! POST {api}/v1/data/projects/{project}/players/{player}/item-batch
//! GET  {api}/v1/data/projects/{project}/players/{player}/items?keys=a&keys=b
//! PUT  {api}/v1/files/projects/{project}/players/{player}/items/{key}
//! GET  {api}/v1/files/projects/{project}/players/{player}/items
//! GET  {api}/v1/files/projects/{project}/players/{player}/items/{key}
//! ```
//! List endpoints are paged; `links.next` is the `after` cursor for the
//! next page. Paging stops when a cursor repeats.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::client::{self, ServiceClient};
use crate::store::blob::BlobStore;
use crate::store::error::{StorageError, StorageResult};
use crate::store::record::RecordStore;
use crate::value::{RecordFields, RecordValue};

#[derive(Debug, Serialize)]
struct SaveBatchRequest<'a> {
    data: Vec<SaveItem<'a>>,
}

#[derive(Debug, Serialize)]
struct SaveItem<'a> {
    key: &'a str,
    value: &'a RecordValue,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataItem {
    key: String,
    value: RecordValue,
}

#[derive(Debug, Deserialize)]
struct FileItem {
    key: String,
}

/// Remote implementation of both `RecordStore` and `BlobStore`.
#[derive(Debug, Clone)]
pub struct HttpCloudStore {
    client: ServiceClient,
    api_url: Url,
}

impl HttpCloudStore {
    pub fn new(client: ServiceClient, api_url: Url) -> Self {
        Self { client, api_url }
    }

    fn data_url(&self, session: &Session, tail: &[&str]) -> Url {
        let mut segments = vec![
            "v1",
            "data",
            "projects",
            self.client.project_id(),
            "players",
            session.player_id(),
        ];
        segments.extend_from_slice(tail);
        client::join_segments(&self.api_url, segments)
    }

    fn files_url(&self, session: &Session, tail: &[&str]) -> Url {
        let mut segments = vec![
            "v1",
            "files",
            "projects",
            self.client.project_id(),
            "players",
            session.player_id(),
        ];
        segments.extend_from_slice(tail);
        client::join_segments(&self.api_url, segments)
    }

    fn authorized(&self, session: &Session, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(session.access_token())
    }

    /// Fetch every page of a paged list endpoint.
    async fn fetch_all<T: serde::de::DeserializeOwned>(
        &self,
        session: &Session,
        url: Url,
        query: &[(&str, String)],
    ) -> StorageResult<Vec<T>> {
        let mut results = Vec::new();
        let mut after: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let mut request = self.authorized(session, Method::GET, url.clone()).query(query);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor)]);
            }

            let response = check(request.send().await?).await?;
            let page: Page<T> = response.json().await?;
            results.extend(page.results);

            match page.links.next {
                Some(next) if !next.is_empty() && seen.insert(next.clone()) => {
                    after = Some(next);
                }
                Some(next) if !next.is_empty() => {
                    warn!(cursor = %next, "Page cursor repeated, stopping");
                    break;
                }
                _ => break,
            }
        }

        Ok(results)
    }
}

/// Pass successful responses through, turn the rest into storage errors.
async fn check(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(StorageError::Unauthorized {
            status: status.as_u16(),
        });
    }

    let (status, message) = client::error_message(response).await;
    Err(StorageError::Api { status, message })
}

#[async_trait]
impl RecordStore for HttpCloudStore {
    async fn save(&self, session: &Session, entries: &RecordFields) -> StorageResult<()> {
        let url = self.data_url(session, &["item-batch"]);
        let body = SaveBatchRequest {
            data: entries
                .iter()
                .map(|(key, value)| SaveItem { key, value })
                .collect(),
        };

        let response = self
            .authorized(session, Method::POST, url)
            .json(&body)
            .send()
            .await?;
        check(response).await?;

        debug!(keys = entries.len(), "Saved records remotely");
        Ok(())
    }

    async fn load(&self, session: &Session, keys: &BTreeSet<String>) -> StorageResult<RecordFields> {
        let url = self.data_url(session, &["items"]);
        let query: Vec<(&str, String)> = keys.iter().map(|key| ("keys", key.clone())).collect();

        let items: Vec<DataItem> = self.fetch_all(session, url, &query).await?;

        Ok(items
            .into_iter()
            .filter(|item| keys.contains(&item.key))
            .map(|item| (item.key, item.value))
            .collect())
    }
}

#[async_trait]
impl BlobStore for HttpCloudStore {
    async fn upload(&self, session: &Session, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let url = self.files_url(session, &["items", key]);

        let response = self
            .authorized(session, Method::PUT, url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;
        check(response).await?;

        debug!(key, size = bytes.len(), "Uploaded blob");
        Ok(())
    }

    async fn list(&self, session: &Session) -> StorageResult<Vec<String>> {
        let url = self.files_url(session, &["items"]);
        let items: Vec<FileItem> = self.fetch_all(session, url, &[]).await?;
        Ok(items.into_iter().map(|item| item.key).collect())
    }

    async fn download(&self, session: &Session, key: &str) -> StorageResult<Vec<u8>> {
        let url = self.files_url(session, &["items", key]);

        let response = self.authorized(session, Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::not_found("blob", key));
        }

        let bytes = check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> HttpCloudStore {
        let client = ServiceClient::new("proj", None, Duration::from_secs(5)).unwrap();
        let api_url = client::parse_base_url("https://api.example.com").unwrap();
        HttpCloudStore::new(client, api_url)
    }

    #[test]
    fn data_url_is_scoped_to_project_and_player() {
        let session = Session::new("player-1", "token");
        let url = store().data_url(&session, &["item-batch"]);
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/data/projects/proj/players/player-1/item-batch"
        );
    }

    #[test]
    fn files_url_encodes_key() {
        let session = Session::new("player-1", "token");
        let url = store().files_url(&session, &["items", "shots/a.png"]);
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/files/projects/proj/players/player-1/items/shots%2Fa.png"
        );
    }

    #[test]
    fn save_batch_body_shape() {
        let mut fields = RecordFields::new();
        fields.insert("level".to_string(), RecordValue::from(50));
        let body = SaveBatchRequest {
            data: fields
                .iter()
                .map(|(key, value)| SaveItem { key, value })
                .collect(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"data": [{"key": "level", "value": 50}]})
        );
    }

    #[test]
    fn page_without_links_has_no_next() {
        let page: Page<FileItem> = serde_json::from_str(r#"{"results":[{"key":"a"}]}"#).unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(page.links.next.is_none());
    }
}
