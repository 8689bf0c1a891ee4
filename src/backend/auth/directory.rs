/**
 * User Directory Client
 *
 * Friendship checks and username lookups live in the user service. The
 * `UserDirectory` trait is what handlers depend on; `HttpUserDirectory`
 * calls the user service's internal JSON endpoints:
 *
 * - `GET  {base}/internal/friends/{a}/{b}` -> `{"are_friends": bool}`
 * - `POST {base}/internal/users/bulk` with `{"ids": [..]}` -> `{"users": [{"id", "username"}]}`
 */

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::models::{UserId, UserProfile};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("user service responded with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, DirectoryError>;

    /// Profiles for the given ids. Unknown ids are simply absent.
    async fn bulk_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, DirectoryError>;
}

/// Resolve ids to usernames in one directory round trip
pub async fn usernames(
    directory: &dyn UserDirectory,
    ids: &[UserId],
) -> Result<HashMap<UserId, String>, DirectoryError> {
    let mut unique: Vec<UserId> = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    Ok(directory
        .bulk_users(&unique)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile.username))
        .collect())
}

#[derive(Deserialize)]
struct FriendshipResponse {
    are_friends: bool,
}

#[derive(Serialize)]
struct BulkUsersRequest<'a> {
    ids: &'a [UserId],
}

#[derive(Deserialize)]
struct BulkUsersResponse {
    users: Vec<UserProfile>,
}

pub struct HttpUserDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, DirectoryError> {
        let url = format!("{}/internal/friends/{}/{}", self.base_url, a, b);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            tracing::warn!("[Directory] friendship check {} -> {}", url, response.status());
            return Err(DirectoryError::Status(response.status().as_u16()));
        }
        Ok(response.json::<FriendshipResponse>().await?.are_friends)
    }

    async fn bulk_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, DirectoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/internal/users/bulk", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&BulkUsersRequest { ids })
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::warn!("[Directory] bulk lookup of {} users -> {}", ids.len(), response.status());
            return Err(DirectoryError::Status(response.status().as_u16()));
        }
        Ok(response.json::<BulkUsersResponse>().await?.users)
    }
}
