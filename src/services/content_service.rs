use crate::{
    database::MongoDB,
    models::{default_difficulty, default_points, Club, Discussion, LeaderboardEntry, Problem, User},
    utils::ApiError,
};
use chrono::Utc;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use serde::Deserialize;

const CLUBS: &str = "clubs";
const USERS: &str = "users";
const DISCUSSIONS: &str = "discussions";
const PROBLEMS: &str = "problems";
const LEADERBOARD: &str = "leaderboard";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub content: Option<String>,
    pub author_name: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateProblemRequest {
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub points: Option<i64>,
}

async fn find_club(db: &MongoDB, club_id: &str) -> Result<Club, ApiError> {
    db.collection::<Club>(CLUBS)
        .find_one(doc! { "id": club_id })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::NotFound("Club not found".to_string()))
}

async fn author_handle(db: &MongoDB, author_id: &str) -> Result<String, ApiError> {
    db.collection::<User>(USERS)
        .find_one(doc! { "userId": author_id })
        .await
        .map_err(ApiError::database)?
        .map(|user| user.handle)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

// Members post discussions; membership is checked at creation time only
pub async fn add_discussion(
    db: &MongoDB,
    club_id: &str,
    author_id: &str,
    request: &CreateDiscussionRequest,
) -> Result<String, ApiError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation(
            "Discussion title is required".to_string(),
        ));
    }

    let club = find_club(db, club_id).await?;

    if !club.is_member(author_id) {
        return Err(ApiError::Forbidden(
            "User is not a member of this club".to_string(),
        ));
    }

    let author_name = match &request.author_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => author_handle(db, author_id).await?,
    };

    let discussion = Discussion {
        oid: None,
        id: ObjectId::new().to_hex(),
        club_id: club_id.to_string(),
        title,
        content: request.content.clone().unwrap_or_default(),
        author_id: author_id.to_string(),
        author_name,
        created_at: Utc::now(),
        comment_count: 0,
        like_count: 0,
    };

    db.collection::<Discussion>(DISCUSSIONS)
        .insert_one(&discussion)
        .await
        .map_err(ApiError::database)?;

    Ok(discussion.id)
}

pub async fn list_discussions(db: &MongoDB, club_id: &str) -> Result<Vec<Discussion>, ApiError> {
    let mut cursor = db
        .collection::<Discussion>(DISCUSSIONS)
        .find(doc! { "clubId": club_id })
        .await
        .map_err(ApiError::database)?;

    let mut discussions = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(discussion) => discussions.push(discussion),
            Err(e) => log::warn!("❌ Skipping unreadable discussion document: {}", e),
        }
    }

    // Newest first
    discussions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(discussions)
}

// Admins post problems
pub async fn add_problem(
    db: &MongoDB,
    club_id: &str,
    author_id: &str,
    request: &CreateProblemRequest,
) -> Result<String, ApiError> {
    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation(
            "Problem title is required".to_string(),
        ));
    }

    let club = find_club(db, club_id).await?;

    if !club.is_admin(author_id) {
        return Err(ApiError::Forbidden(
            "Only club admins can add problems".to_string(),
        ));
    }

    let problem = Problem {
        oid: None,
        id: ObjectId::new().to_hex(),
        club_id: club_id.to_string(),
        title,
        description: request.description.clone().unwrap_or_default(),
        difficulty: request
            .difficulty
            .clone()
            .unwrap_or_else(default_difficulty),
        points: request.points.unwrap_or_else(default_points),
        author_id: author_id.to_string(),
        created_at: Utc::now(),
        solved_count: 0,
    };

    db.collection::<Problem>(PROBLEMS)
        .insert_one(&problem)
        .await
        .map_err(ApiError::database)?;

    Ok(problem.id)
}

pub async fn list_problems(db: &MongoDB, club_id: &str) -> Result<Vec<Problem>, ApiError> {
    let mut cursor = db
        .collection::<Problem>(PROBLEMS)
        .find(doc! { "clubId": club_id })
        .await
        .map_err(ApiError::database)?;

    let mut problems = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(problem) => problems.push(problem),
            Err(e) => log::warn!("❌ Skipping unreadable problem document: {}", e),
        }
    }

    problems.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(problems)
}

// Read-only surface; an external grader writes the entries
pub async fn list_leaderboard(
    db: &MongoDB,
    club_id: &str,
) -> Result<Vec<LeaderboardEntry>, ApiError> {
    let mut cursor = db
        .collection::<LeaderboardEntry>(LEADERBOARD)
        .find(doc! { "clubId": club_id })
        .await
        .map_err(ApiError::database)?;

    let mut entries = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => log::warn!("❌ Skipping unreadable leaderboard document: {}", e),
        }
    }

    entries.sort_by(|a, b| b.points.cmp(&a.points));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::club_service::{self, CreateClubRequest};

    async fn test_db() -> MongoDB {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/clubhub_test".to_string());
        MongoDB::new(&uri).await.expect("MongoDB must be running")
    }

    async fn seed_user(db: &MongoDB) -> User {
        let user = User {
            id: None,
            user_id: ObjectId::new().to_hex(),
            handle: format!("user-{}", ObjectId::new().to_hex()),
            email: format!("{}@test.local", ObjectId::new().to_hex()),
            password: "x".to_string(),
            clubs: vec![],
            created_at: Utc::now(),
        };
        db.collection::<User>(USERS)
            .insert_one(&user)
            .await
            .unwrap();
        user
    }

    async fn seed_club(db: &MongoDB, creator: &User, is_public: bool) -> String {
        let request = CreateClubRequest {
            name: format!("club-{}", ObjectId::new().to_hex()),
            description: None,
            is_public: Some(is_public),
            banner_url: None,
            avatar_url: None,
        };
        club_service::create_club(db, &creator.user_id, &request)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn non_member_cannot_post_discussion() {
        let db = test_db().await;
        let creator = seed_user(&db).await;
        let outsider = seed_user(&db).await;
        let club_id = seed_club(&db, &creator, true).await;

        let request = CreateDiscussionRequest {
            title: "Hello".to_string(),
            content: None,
            author_name: None,
        };
        let err = add_discussion(&db, &club_id, &outsider.user_id, &request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn member_discussion_lists_newest_first() {
        let db = test_db().await;
        let creator = seed_user(&db).await;
        let club_id = seed_club(&db, &creator, true).await;

        for title in ["first", "second"] {
            let request = CreateDiscussionRequest {
                title: title.to_string(),
                content: Some("body".to_string()),
                author_name: None,
            };
            add_discussion(&db, &club_id, &creator.user_id, &request)
                .await
                .unwrap();
        }

        let discussions = list_discussions(&db, &club_id).await.unwrap();
        assert_eq!(discussions.len(), 2);
        assert_eq!(discussions[0].title, "second");
        assert_eq!(discussions[0].comment_count, 0);
        assert_eq!(discussions[0].author_name, creator.handle);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn member_but_not_admin_cannot_post_problem() {
        let db = test_db().await;
        let creator = seed_user(&db).await;
        let member = seed_user(&db).await;
        let club_id = seed_club(&db, &creator, true).await;
        club_service::join_club(&db, &club_id, &member.user_id)
            .await
            .unwrap();

        let request = CreateProblemRequest {
            title: "Two Sum".to_string(),
            description: None,
            difficulty: None,
            points: None,
        };
        let err = add_problem(&db, &club_id, &member.user_id, &request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");

        // The admin succeeds and defaults are applied
        add_problem(&db, &club_id, &creator.user_id, &request)
            .await
            .unwrap();
        let problems = list_problems(&db, &club_id).await.unwrap();
        assert_eq!(problems[0].difficulty, "medium");
        assert_eq!(problems[0].points, 100);
    }
}
