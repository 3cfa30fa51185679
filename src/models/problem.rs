use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub fn default_difficulty() -> String {
    "medium".to_string()
}

pub fn default_points() -> i64 {
    100
}

/// Practice problem owned by exactly one club. Only club admins create them.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub oid: Option<ObjectId>,
    pub id: String,
    pub club_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_points")]
    pub points: i64,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub solved_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let doc = serde_json::json!({
            "id": "p1",
            "clubId": "c1",
            "title": "Two Sum",
            "authorId": "u1",
            "createdAt": "2026-08-07T00:00:00Z",
        });
        let problem: Problem = serde_json::from_value(doc).unwrap();
        assert_eq!(problem.difficulty, "medium");
        assert_eq!(problem.points, 100);
        assert_eq!(problem.solved_count, 0);
    }
}
