use crate::{
    database::MongoDB,
    models::{Club, Discussion, LeaderboardEntry, Problem, User},
    utils::ApiError,
};
use futures::stream::StreamExt;
use mongodb::bson::doc;
use serde::Deserialize;

const CLUBS: &str = "clubs";
const USERS: &str = "users";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClubRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub banner_url: Option<String>,
    pub avatar_url: Option<String>,
}

async fn find_user(db: &MongoDB, user_id: &str) -> Result<User, ApiError> {
    db.collection::<User>(USERS)
        .find_one(doc! { "userId": user_id })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn find_club(db: &MongoDB, club_id: &str) -> Result<Club, ApiError> {
    db.collection::<Club>(CLUBS)
        .find_one(doc! { "id": club_id })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::NotFound("Club not found".to_string()))
}

/// Persist the membership fields after a local mutation. `memberCount` is
/// always written as `members.len()`, so the counter cannot drift from the
/// set it counts.
async fn store_membership(db: &MongoDB, club: &Club) -> Result<(), ApiError> {
    db.collection::<Club>(CLUBS)
        .update_one(
            doc! { "id": &club.id },
            doc! { "$set": {
                "members": club.members.clone(),
                "memberHandles": club.member_handles.clone(),
                "admins": club.admins.clone(),
                "memberCount": club.member_count,
            }},
        )
        .await
        .map_err(ApiError::database)?;
    Ok(())
}

// Create a club with the caller as sole member and admin
pub async fn create_club(
    db: &MongoDB,
    user_id: &str,
    request: &CreateClubRequest,
) -> Result<String, ApiError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("Club name is required".to_string()));
    }

    let collection = db.collection::<Club>(CLUBS);

    if collection
        .find_one(doc! { "name": &name })
        .await
        .map_err(ApiError::database)?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A club with this name already exists".to_string(),
        ));
    }

    let user = find_user(db, user_id).await?;

    let club = Club::new(
        name,
        request.description.clone().unwrap_or_default(),
        user.user_id.clone(),
        user.handle,
        request.is_public.unwrap_or(true),
        request.banner_url.clone(),
        request.avatar_url.clone(),
    );

    collection.insert_one(&club).await.map_err(|e| {
        if e.to_string().contains("E11000") {
            ApiError::Conflict("A club with this name already exists".to_string())
        } else {
            ApiError::database(e)
        }
    })?;

    // Club document first, user document second; the club is authoritative
    // and a dangling id in the user list is skipped on read.
    db.collection::<User>(USERS)
        .update_one(
            doc! { "userId": user_id },
            doc! { "$addToSet": { "clubs": &club.id } },
        )
        .await
        .map_err(ApiError::database)?;

    Ok(club.id)
}

// Get club by id, repairing the denormalized handle list if it desynced
pub async fn get_club(db: &MongoDB, club_id: &str) -> Result<Club, ApiError> {
    let mut club = find_club(db, club_id).await?;

    if club.handles_desynced() {
        log::warn!(
            "⚠️ Club {} memberHandles desynced ({} handles / {} members), reconciling",
            club.id,
            club.member_handles.len(),
            club.members.len()
        );
        reconcile_member_handles(db, &mut club).await?;
    }

    Ok(club)
}

pub async fn get_all_clubs(db: &MongoDB) -> Result<Vec<Club>, ApiError> {
    let collection = db.collection::<Club>(CLUBS);

    let mut cursor = collection
        .find(doc! {})
        .await
        .map_err(ApiError::database)?;

    let mut clubs = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(club) => clubs.push(club),
            Err(e) => log::warn!("❌ Skipping unreadable club document: {}", e),
        }
    }

    Ok(clubs)
}

pub async fn get_public_clubs(db: &MongoDB) -> Result<Vec<Club>, ApiError> {
    let clubs = get_all_clubs(db).await?;
    Ok(clubs.into_iter().filter(|club| club.is_public).collect())
}

// Case-insensitive substring search over name and description. Full scan;
// fine at this scale.
pub async fn search_clubs(db: &MongoDB, query: &str) -> Result<Vec<Club>, ApiError> {
    let needle = query.trim().to_lowercase();
    let clubs = get_all_clubs(db).await?;

    Ok(clubs
        .into_iter()
        .filter(|club| {
            club.name.to_lowercase().contains(&needle)
                || club.description.to_lowercase().contains(&needle)
        })
        .collect())
}

// Resolve the user's club-id list; ids of deleted clubs are silently skipped
pub async fn get_user_clubs(db: &MongoDB, user_id: &str) -> Result<Vec<Club>, ApiError> {
    let user = find_user(db, user_id).await?;
    let collection = db.collection::<Club>(CLUBS);

    let mut clubs = Vec::new();
    for club_id in &user.clubs {
        if let Some(club) = collection
            .find_one(doc! { "id": club_id })
            .await
            .map_err(ApiError::database)?
        {
            clubs.push(club);
        }
    }

    Ok(clubs)
}

/// Join a public club. Returns `false` when the caller was already a member
/// (idempotent success).
pub async fn join_club(db: &MongoDB, club_id: &str, user_id: &str) -> Result<bool, ApiError> {
    let mut club = find_club(db, club_id).await?;

    if !club.is_public {
        return Err(ApiError::Forbidden("This club is private".to_string()));
    }

    if club.is_member(user_id) {
        return Ok(false);
    }

    let user = find_user(db, user_id).await?;

    club.add_member(user_id, &user.handle);
    store_membership(db, &club).await?;

    db.collection::<User>(USERS)
        .update_one(
            doc! { "userId": user_id },
            doc! { "$addToSet": { "clubs": club_id } },
        )
        .await
        .map_err(ApiError::database)?;

    Ok(true)
}

pub async fn leave_club(db: &MongoDB, club_id: &str, user_id: &str) -> Result<(), ApiError> {
    let mut club = find_club(db, club_id).await?;

    if club.is_creator(user_id) {
        return Err(ApiError::Forbidden(
            "Club creator cannot leave the club".to_string(),
        ));
    }

    // No-op for a non-member; the recomputed count stays consistent either way
    club.remove_member(user_id);
    store_membership(db, &club).await?;

    db.collection::<User>(USERS)
        .update_one(
            doc! { "userId": user_id },
            doc! { "$pull": { "clubs": club_id } },
        )
        .await
        .map_err(ApiError::database)?;

    Ok(())
}

// Delete a club and everything it owns. Sub-collections go first, the club
// document second, member lists last; a crash mid-sequence leaves only
// dangling ids, which reads already skip.
pub async fn delete_club(db: &MongoDB, club_id: &str, requester_id: &str) -> Result<(), ApiError> {
    let club = find_club(db, club_id).await?;

    if !club.is_creator(requester_id) {
        return Err(ApiError::Forbidden(
            "Only the club creator can delete the club".to_string(),
        ));
    }

    db.collection::<Discussion>("discussions")
        .delete_many(doc! { "clubId": club_id })
        .await
        .map_err(ApiError::database)?;
    db.collection::<Problem>("problems")
        .delete_many(doc! { "clubId": club_id })
        .await
        .map_err(ApiError::database)?;
    db.collection::<LeaderboardEntry>("leaderboard")
        .delete_many(doc! { "clubId": club_id })
        .await
        .map_err(ApiError::database)?;

    db.collection::<Club>(CLUBS)
        .delete_one(doc! { "id": club_id })
        .await
        .map_err(ApiError::database)?;

    db.collection::<User>(USERS)
        .update_many(
            doc! { "clubs": club_id },
            doc! { "$pull": { "clubs": club_id } },
        )
        .await
        .map_err(ApiError::database)?;

    Ok(())
}

/// Rebuild `memberHandles` from the users collection, in `members` order.
/// Users are never deleted, so every member id should resolve; one that does
/// not is dropped from the handle list.
pub async fn reconcile_member_handles(db: &MongoDB, club: &mut Club) -> Result<(), ApiError> {
    let users = db.collection::<User>(USERS);

    let mut handles = Vec::with_capacity(club.members.len());
    for member_id in &club.members {
        if let Some(user) = users
            .find_one(doc! { "userId": member_id })
            .await
            .map_err(ApiError::database)?
        {
            handles.push(user.handle);
        }
    }

    club.member_handles = handles;
    club.member_count = club.members.len() as i64;
    store_membership(db, club).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    async fn test_db() -> MongoDB {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/clubhub_test".to_string());
        MongoDB::new(&uri).await.expect("MongoDB must be running")
    }

    async fn seed_user(db: &MongoDB, handle: &str) -> User {
        let user = User {
            id: None,
            user_id: ObjectId::new().to_hex(),
            handle: format!("{}-{}", handle, ObjectId::new().to_hex()),
            email: format!("{}@test.local", ObjectId::new().to_hex()),
            password: "x".to_string(),
            clubs: vec![],
            created_at: chrono::Utc::now(),
        };
        db.collection::<User>(USERS)
            .insert_one(&user)
            .await
            .unwrap();
        user
    }

    fn unique_name(prefix: &str) -> String {
        format!("{}-{}", prefix, ObjectId::new().to_hex())
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn join_then_leave_restores_membership() {
        let db = test_db().await;
        let creator = seed_user(&db, "alice").await;
        let joiner = seed_user(&db, "bob").await;

        let request = CreateClubRequest {
            name: unique_name("Algo"),
            description: Some("club".to_string()),
            is_public: Some(true),
            banner_url: None,
            avatar_url: None,
        };
        let club_id = create_club(&db, &creator.user_id, &request).await.unwrap();

        assert!(join_club(&db, &club_id, &joiner.user_id).await.unwrap());
        let club = get_club(&db, &club_id).await.unwrap();
        assert_eq!(club.member_count, 2);
        assert!(club.is_member(&joiner.user_id));

        // Second join is an idempotent no-op
        assert!(!join_club(&db, &club_id, &joiner.user_id).await.unwrap());

        leave_club(&db, &club_id, &joiner.user_id).await.unwrap();
        let club = get_club(&db, &club_id).await.unwrap();
        assert_eq!(club.member_count, 1);
        assert_eq!(club.members, vec![creator.user_id.clone()]);
        assert_eq!(club.member_handles, vec![creator.handle.clone()]);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn creator_cannot_leave() {
        let db = test_db().await;
        let creator = seed_user(&db, "alice").await;

        let request = CreateClubRequest {
            name: unique_name("Algo"),
            description: None,
            is_public: Some(true),
            banner_url: None,
            avatar_url: None,
        };
        let club_id = create_club(&db, &creator.user_id, &request).await.unwrap();

        let err = leave_club(&db, &club_id, &creator.user_id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn private_club_rejects_join() {
        let db = test_db().await;
        let creator = seed_user(&db, "alice").await;
        let joiner = seed_user(&db, "bob").await;

        let request = CreateClubRequest {
            name: unique_name("Secret"),
            description: None,
            is_public: Some(false),
            banner_url: None,
            avatar_url: None,
        };
        let club_id = create_club(&db, &creator.user_id, &request).await.unwrap();

        let err = join_club(&db, &club_id, &joiner.user_id).await.unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn delete_cascades_and_cleans_member_lists() {
        let db = test_db().await;
        let creator = seed_user(&db, "alice").await;
        let member = seed_user(&db, "bob").await;

        let request = CreateClubRequest {
            name: unique_name("Doomed"),
            description: None,
            is_public: Some(true),
            banner_url: None,
            avatar_url: None,
        };
        let club_id = create_club(&db, &creator.user_id, &request).await.unwrap();
        join_club(&db, &club_id, &member.user_id).await.unwrap();

        let err = delete_club(&db, &club_id, &member.user_id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");

        delete_club(&db, &club_id, &creator.user_id).await.unwrap();
        let err = get_club(&db, &club_id).await.unwrap_err();
        assert_eq!(err.code(), "not_found");

        let member_after = find_user(&db, &member.user_id).await.unwrap();
        assert!(!member_after.clubs.contains(&club_id));
    }
}
