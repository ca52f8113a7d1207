use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppResult;

pub mod paths;
pub mod supabase;

/// Seam over the blob store. The backend is append-only (blind overwrite is
/// rejected), so callers that need replace semantics list-then-remove first;
/// see `registration::assets::put_asset`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, blob: Bytes, content_type: &str) -> AppResult<()>;

    /// Object names (not full paths) directly under `dir`.
    async fn list(&self, dir: &str) -> AppResult<Vec<String>>;

    async fn remove(&self, paths: &[String]) -> AppResult<()>;

    fn public_url(&self, path: &str) -> String;
}
