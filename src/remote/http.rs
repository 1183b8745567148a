use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::Id;

use super::{Collection, RemoteMirror};

/// Remote mirror backed by a plain HTTP document store.
///
/// Layout: `PUT base/{collection}/{id}` upserts one document,
/// `DELETE base/{collection}/{id}` removes it, and `GET base/{collection}`
/// returns the collection as a JSON array.
pub struct HttpDocumentMirror {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    online: AtomicBool,
}

impl HttpDocumentMirror {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            online: AtomicBool::new(true),
        }
    }

    /// Use a bearer token on every request.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Use a custom reqwest client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    /// Check reachability of the document store and update the connectivity
    /// flag accordingly.
    pub async fn probe(&self) -> bool {
        let online = match self.client.head(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        };
        self.set_online(online);
        online
    }

    fn document_url(&self, collection: Collection, id: &Id) -> String {
        format!("{}/{}/{}", self.base_url, collection.as_str(), id)
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection.as_str())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl RemoteMirror for HttpDocumentMirror {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    async fn upsert(&self, collection: Collection, id: &Id, record: Value) -> Result<()> {
        let request = self.client.put(self.document_url(collection, id)).json(&record);
        self.authorize(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach remote store for {collection}/{id}"))?
            .error_for_status()
            .with_context(|| format!("Remote upsert rejected for {collection}/{id}"))?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &Id) -> Result<()> {
        let request = self.client.delete(self.document_url(collection, id));
        let response = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach remote store for {collection}/{id}"))?;

        // Deleting an already-absent document is a success.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        response
            .error_for_status()
            .with_context(|| format!("Remote delete rejected for {collection}/{id}"))?;
        Ok(())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>> {
        let request = self.client.get(self.collection_url(collection));
        let records = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach remote store for {collection}"))?
            .error_for_status()
            .with_context(|| format!("Remote list rejected for {collection}"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse remote {collection} listing"))?;
        Ok(records)
    }
}
