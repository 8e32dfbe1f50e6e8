//! Media library operations.
//!
//! Uploads are two-phase: bytes go to object storage first, then a
//! `media` row records the file's metadata and public URL. Deletion runs
//! the other way round so a failed storage removal never leaves an
//! orphaned row pointing at nothing.

use crate::api::{ApiClient, TableQuery};
use crate::error::{DataError, DataResult};
use crate::storage::{StorageClient, StoredObject, UploadResult};
use loreforge_types::{Media, MediaPatch, NewMedia};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page size used when the caller does not set a limit.
pub const DEFAULT_PAGE: u32 = 50;

/// A page of media records with the exact total count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaPage {
    pub media: Vec<Media>,
    pub count: Option<u64>,
}

/// Lists media records, newest first, with an exact count.
pub async fn get_media_records(
    api: &ApiClient,
    limit: Option<u32>,
    offset: Option<u32>,
) -> DataResult<MediaPage> {
    let (media, count) = api
        .get_rows_counted(
            "media",
            TableQuery::new()
                .select("*")
                .order("created_at", false)
                .limit(limit.unwrap_or(DEFAULT_PAGE))
                .offset(offset.unwrap_or(0)),
        )
        .await?;
    Ok(MediaPage { media, count })
}

/// Uploads a file and returns its storage path and public URL. The
/// caller records it with [`save_media_record`].
pub async fn upload_file(
    storage: &StorageClient,
    folder: &str,
    original_name: &str,
    mime_type: &str,
    bytes: Vec<u8>,
) -> DataResult<UploadResult> {
    storage.upload(folder, original_name, mime_type, bytes).await
}

/// Lists the raw objects in a storage folder, newest first. Shows what
/// is actually in the bucket, including files no library row points at.
pub async fn list_files(storage: &StorageClient, folder: &str) -> DataResult<Vec<StoredObject>> {
    storage.list(folder).await
}

/// Records an uploaded file in the media library, stamping the signed-in
/// user as uploader.
pub async fn save_media_record(api: &ApiClient, mut record: NewMedia) -> DataResult<Media> {
    let user = match api.auth() {
        Some(auth) => auth.current_user().await,
        None => None,
    };
    let user = user.ok_or(DataError::Unauthenticated)?;
    record.uploaded_by = Some(user.id);

    api.insert_row("media", &record).await
}

pub async fn update_media_record(
    api: &ApiClient,
    id: Uuid,
    patch: MediaPatch,
) -> DataResult<Media> {
    api.update_row("media", TableQuery::new().eq("id", id), &patch)
        .await
}

/// Deletes a media record and its stored object.
///
/// The storage object is removed before the row, so a failure leaves
/// the record visible and retryable rather than silently orphaning the
/// object.
pub async fn delete_media_record(
    api: &ApiClient,
    storage: &StorageClient,
    id: Uuid,
) -> DataResult<()> {
    #[derive(Deserialize)]
    struct PathRow {
        storage_path: String,
    }

    let row: PathRow = api
        .get_row("media", TableQuery::new().select("storage_path").eq("id", id))
        .await?;

    storage.delete(&row.storage_path).await?;
    api.delete_rows("media", TableQuery::new().eq("id", id))
        .await
}
