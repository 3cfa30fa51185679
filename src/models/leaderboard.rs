use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Per-club leaderboard row. Read-only here; an external grader writes it.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub oid: Option<ObjectId>,
    pub club_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub solved_count: i64,
}
