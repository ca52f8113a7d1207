use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use crate::storage::ObjectStore;

/// Raw-HTTP client for a Supabase-style storage API. The object endpoint
/// rejects uploads to an occupied path, so replace is list + remove + upload
/// (driven by the coordinator, not here).
#[derive(Clone)]
pub struct SupabaseStore {
    base_url: String,
    public_base_url: String,
    bucket: String,
    service_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            service_key: config.service_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, path)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStore {
    async fn upload(&self, path: &str, blob: Bytes, content_type: &str) -> AppResult<()> {
        let resp = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header("content-type", content_type)
            .body(blob)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "upload of {path} rejected ({status}): {body}"
            )));
        }
        Ok(())
    }

    async fn list(&self, dir: &str) -> AppResult<Vec<String>> {
        let url = format!("{}/object/list/{}", self.base_url, self.bucket);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "prefix": dir, "limit": 100 }))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("list request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(AppError::Storage(format!("list of {dir} failed ({status})")));
        }

        let entries: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("list response parse failed: {e}")))?;

        Ok(entries
            .iter()
            .filter_map(|e| e["name"].as_str().map(String::from))
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        let url = format!("{}/object/{}", self.base_url, self.bucket);
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("remove request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(AppError::Storage(format!("remove failed ({status})")));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.public_base_url, self.bucket, path
        )
    }
}
