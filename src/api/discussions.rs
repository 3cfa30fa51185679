use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::{require_auth, AuthedUser},
    services::content_service,
    services::content_service::CreateDiscussionRequest,
};

#[utoipa::path(
    post,
    path = "/api/clubs/{club_id}/discussions",
    tag = "Discussions",
    request_body = CreateDiscussionRequest,
    responses(
        (status = 200, description = "Discussion created"),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a club member"),
        (status = 404, description = "Club not found")
    )
)]
pub async fn add_discussion(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    path: web::Path<String>,
    request: web::Json<CreateDiscussionRequest>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let club_id = path.into_inner();
    log::info!("💬 POST /api/clubs/{}/discussions - title: {}", club_id, request.title);

    match content_service::add_discussion(&db, &club_id, &user.user_id, &request).await {
        Ok(discussion_id) => {
            log::info!("✅ Discussion created: {}", discussion_id);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "discussionId": discussion_id
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to add discussion in {}: {}", club_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/clubs/{club_id}/discussions",
    tag = "Discussions",
    responses(
        (status = 200, description = "Discussions, newest first")
    )
)]
pub async fn get_discussions(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let club_id = path.into_inner();

    match content_service::list_discussions(&db, &club_id).await {
        Ok(discussions) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "discussions": discussions
        })),
        Err(e) => {
            log::error!("❌ Failed to list discussions for {}: {}", club_id, e);
            e.to_response()
        }
    }
}
