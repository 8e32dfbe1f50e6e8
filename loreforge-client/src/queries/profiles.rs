//! Profile operations.

use crate::api::{ApiClient, TableQuery};
use crate::error::DataResult;
use loreforge_types::{Profile, ProfilePatch};
use uuid::Uuid;

pub async fn get_profile(api: &ApiClient, user_id: Uuid) -> DataResult<Profile> {
    api.get_row("profiles", TableQuery::new().select("*").eq("id", user_id))
        .await
}

pub async fn update_profile(
    api: &ApiClient,
    user_id: Uuid,
    patch: ProfilePatch,
) -> DataResult<Profile> {
    api.update_row("profiles", TableQuery::new().eq("id", user_id), &patch)
        .await
}
