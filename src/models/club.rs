use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Club document. `members`, `admins` and `member_handles` are maintained
/// together; `member_handles` runs parallel to `members` and `member_count`
/// is recomputed from `members` on every mutation instead of incremented.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub oid: Option<ObjectId>,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub banner_url: Option<String>,
    pub avatar_url: Option<String>,
    pub is_public: bool,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub member_handles: Vec<String>,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub member_count: i64,
}

impl Club {
    /// Fresh club with the creator as sole member and admin.
    pub fn new(
        name: String,
        description: String,
        created_by: String,
        creator_handle: String,
        is_public: bool,
        banner_url: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            oid: None,
            id: ObjectId::new().to_hex(),
            name,
            description,
            created_by: created_by.clone(),
            created_at: Utc::now(),
            banner_url,
            avatar_url,
            is_public,
            members: vec![created_by.clone()],
            member_handles: vec![creator_handle],
            admins: vec![created_by],
            member_count: 1,
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.iter().any(|a| a == user_id)
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    /// Append a member and their handle. Idempotent: adding an existing
    /// member changes nothing.
    pub fn add_member(&mut self, user_id: &str, handle: &str) {
        if self.is_member(user_id) {
            return;
        }
        self.members.push(user_id.to_string());
        self.member_handles.push(handle.to_string());
        self.member_count = self.members.len() as i64;
    }

    /// Remove a member from `members`, `admins` and the parallel handle slot.
    /// No-op for a non-member; the caller enforces the creator rule.
    pub fn remove_member(&mut self, user_id: &str) {
        if let Some(pos) = self.members.iter().position(|m| m == user_id) {
            self.members.remove(pos);
            if pos < self.member_handles.len() {
                self.member_handles.remove(pos);
            }
        }
        self.admins.retain(|a| a != user_id);
        self.member_count = self.members.len() as i64;
    }

    /// The parallel arrays can desync if a past write was interrupted.
    pub fn handles_desynced(&self) -> bool {
        self.member_handles.len() != self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club() -> Club {
        Club::new(
            "Algo".to_string(),
            "Competitive programming".to_string(),
            "u1".to_string(),
            "alice".to_string(),
            true,
            None,
            None,
        )
    }

    #[test]
    fn creator_is_member_and_admin() {
        let c = club();
        assert!(c.is_member("u1"));
        assert!(c.is_admin("u1"));
        assert!(c.is_creator("u1"));
        assert_eq!(c.member_count, 1);
        assert_eq!(c.member_handles, vec!["alice"]);
    }

    #[test]
    fn join_then_leave_restores_state() {
        let mut c = club();
        c.add_member("u2", "bob");
        assert_eq!(c.members, vec!["u1", "u2"]);
        assert_eq!(c.member_handles, vec!["alice", "bob"]);
        assert_eq!(c.member_count, 2);

        c.remove_member("u2");
        assert_eq!(c.members, vec!["u1"]);
        assert_eq!(c.member_handles, vec!["alice"]);
        assert_eq!(c.member_count, 1);
    }

    #[test]
    fn add_member_is_idempotent() {
        let mut c = club();
        c.add_member("u2", "bob");
        c.add_member("u2", "bob");
        assert_eq!(c.members.len(), 2);
        assert_eq!(c.member_handles.len(), 2);
        assert_eq!(c.member_count, 2);
    }

    #[test]
    fn remove_member_drops_admin_too() {
        let mut c = club();
        c.add_member("u2", "bob");
        c.admins.push("u2".to_string());
        c.remove_member("u2");
        assert!(!c.is_admin("u2"));
        assert!(c.admins.iter().all(|a| c.is_member(a)));
    }

    #[test]
    fn remove_nonmember_is_noop() {
        let mut c = club();
        c.remove_member("u9");
        assert_eq!(c.members, vec!["u1"]);
        assert_eq!(c.member_count, 1);
    }

    #[test]
    fn count_tracks_members_length() {
        let mut c = club();
        for i in 0..5 {
            c.add_member(&format!("m{}", i), &format!("h{}", i));
        }
        assert_eq!(c.member_count, c.members.len() as i64);
        c.remove_member("m2");
        assert_eq!(c.member_count, c.members.len() as i64);
    }
}
