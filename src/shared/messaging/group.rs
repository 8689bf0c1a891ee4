//! Group request and response bodies

use serde::{Deserialize, Serialize};

use crate::shared::models::{Group, UserId};

/// `POST /groups`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateGroupResponse {
    pub group_id: i64,
}

/// `GET /groups`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGroupsResponse {
    pub groups: Vec<Group>,
}
