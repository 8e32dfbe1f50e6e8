//! Media facade: cached library listing and upload/delete flows.

use crate::api::ApiClient;
use crate::cache::QueryClient;
use crate::error::DataResult;
use crate::keys::media_keys;
use crate::queries::media::{self, MediaPage};
use crate::storage::{StorageClient, StoredObject, UploadResult};
use loreforge_types::{Media, MediaPatch, NewMedia};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct MediaStore {
    api: Arc<ApiClient>,
    storage: Arc<StorageClient>,
    cache: QueryClient,
}

impl MediaStore {
    pub fn new(api: Arc<ApiClient>, storage: Arc<StorageClient>, cache: QueryClient) -> Self {
        Self { api, storage, cache }
    }

    pub async fn list(&self, limit: Option<u32>, offset: Option<u32>) -> DataResult<MediaPage> {
        // The key encodes the limit the query will actually use, so an
        // unset limit and an explicit default-sized one share an entry.
        let key = media_keys::lists().push(format!(
            "page={}:{}",
            offset.unwrap_or(0),
            limit.unwrap_or(media::DEFAULT_PAGE)
        ));
        let api = self.api.clone();
        self.cache
            .fetch(key, self.api.config().stale_window(), move || {
                let api = api.clone();
                async move { media::get_media_records(&api, limit, offset).await }
            })
            .await
    }

    /// Lists the bucket folder itself. Not cached: the bucket is the
    /// source of truth for orphan cleanup, so reads go straight through.
    pub async fn browse(&self, folder: &str) -> DataResult<Vec<StoredObject>> {
        media::list_files(&self.storage, folder).await
    }

    /// Uploads a file and records it in the library in one flow.
    pub async fn upload(
        &self,
        folder: &str,
        original_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> DataResult<Media> {
        let size_bytes = bytes.len() as i64;
        let uploaded: UploadResult = media::upload_file(
            &self.storage,
            folder,
            original_name,
            mime_type,
            bytes,
        )
        .await?;

        let record = NewMedia {
            filename: original_name.to_string(),
            storage_path: uploaded.path,
            url: uploaded.public_url,
            mime_type: Some(mime_type.to_string()),
            size_bytes: Some(size_bytes),
            alt_text: None,
            story_id: None,
            chapter_id: None,
            entity_id: None,
            uploaded_by: None, // stamped by save_media_record
        };
        let saved = media::save_media_record(&self.api, record).await?;
        self.cache.invalidate(&media_keys::lists()).await;
        Ok(saved)
    }

    pub async fn update(&self, id: Uuid, patch: MediaPatch) -> DataResult<Media> {
        let updated = media::update_media_record(&self.api, id, patch).await?;
        self.cache.invalidate(&media_keys::lists()).await;
        Ok(updated)
    }

    /// Deletes the record and its stored object.
    pub async fn delete(&self, id: Uuid) -> DataResult<()> {
        media::delete_media_record(&self.api, &self.storage, id).await?;
        self.cache.invalidate(&media_keys::lists()).await;
        Ok(())
    }
}
