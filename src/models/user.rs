use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// User document. `user_id` is the primary identifier; `_id` is left to
/// MongoDB. Users are never deleted.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub handle: String,
    pub email: String,
    /// bcrypt hash, never exposed through the API
    pub password: String,
    /// Ids of clubs the user belongs to. Advisory: ids of deleted clubs are
    /// skipped on read.
    #[serde(default)]
    pub clubs: Vec<String>,
    pub created_at: DateTime<Utc>,
}
