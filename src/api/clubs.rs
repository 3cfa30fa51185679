use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    middleware::auth::{require_auth, AuthedUser},
    services::club_service,
    services::club_service::CreateClubRequest,
    utils::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub public: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/clubs",
    tag = "Clubs",
    request_body = CreateClubRequest,
    responses(
        (status = 200, description = "Club created"),
        (status = 400, description = "Missing or duplicate club name"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_club(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    request: web::Json<CreateClubRequest>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };
    log::info!("🏠 POST /api/clubs - name: {}", request.name);

    match club_service::create_club(&db, &user.user_id, &request).await {
        Ok(club_id) => {
            log::info!("✅ Club created: {}", club_id);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "clubId": club_id
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to create club: {}", e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/clubs/{club_id}",
    tag = "Clubs",
    responses(
        (status = 200, description = "Club found"),
        (status = 404, description = "Club not found")
    )
)]
pub async fn get_club(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let club_id = path.into_inner();

    match club_service::get_club(&db, &club_id).await {
        Ok(club) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "club": club
        })),
        Err(e) => {
            log::warn!("❌ Failed to get club {}: {}", club_id, e);
            e.to_response()
        }
    }
}

// GET /api/clubs - all clubs, or only public ones with ?public=true
pub async fn get_all_clubs(db: web::Data<MongoDB>, query: web::Query<ListQuery>) -> HttpResponse {
    let result = if query.public.unwrap_or(false) {
        club_service::get_public_clubs(&db).await
    } else {
        club_service::get_all_clubs(&db).await
    };

    match result {
        Ok(clubs) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "clubs": clubs
        })),
        Err(e) => {
            log::error!("❌ Failed to list clubs: {}", e);
            e.to_response()
        }
    }
}

pub async fn search_clubs(db: web::Data<MongoDB>, query: web::Query<SearchQuery>) -> HttpResponse {
    let needle = query.query.clone().unwrap_or_default();
    log::info!("🔍 GET /api/clubs/search - query: {}", needle);

    match club_service::search_clubs(&db, &needle).await {
        Ok(clubs) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "clubs": clubs
        })),
        Err(e) => {
            log::error!("❌ Club search failed: {}", e);
            e.to_response()
        }
    }
}

pub async fn get_user_clubs(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(response) = require_auth(user) {
        return response;
    }
    let user_id = path.into_inner();

    match club_service::get_user_clubs(&db, &user_id).await {
        Ok(clubs) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "clubs": clubs
        })),
        Err(e) => {
            log::warn!("❌ Failed to list clubs for user {}: {}", user_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/clubs/{club_id}/join",
    tag = "Clubs",
    responses(
        (status = 200, description = "Joined, or already a member"),
        (status = 400, description = "Club is private"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Club not found")
    )
)]
pub async fn join_club(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    path: web::Path<String>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let club_id = path.into_inner();
    log::info!("➕ POST /api/clubs/{}/join - user: {}", club_id, user.user_id);

    match club_service::join_club(&db, &club_id, &user.user_id).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "msg": "User is already a member of this club"
        })),
        // Legacy clients expect 400 for a private club, not 403
        Err(ApiError::Forbidden(msg)) => {
            log::warn!("❌ Join rejected for {}: {}", club_id, msg);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "code": "forbidden",
                "error": msg
            }))
        }
        Err(e) => {
            log::warn!("❌ Join failed for {}: {}", club_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/clubs/{club_id}/leave",
    tag = "Clubs",
    responses(
        (status = 200, description = "Left the club"),
        (status = 400, description = "Creator cannot leave"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Club not found")
    )
)]
pub async fn leave_club(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    path: web::Path<String>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let club_id = path.into_inner();
    log::info!("➖ POST /api/clubs/{}/leave - user: {}", club_id, user.user_id);

    match club_service::leave_club(&db, &club_id, &user.user_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        // Legacy clients expect 400 when the creator tries to leave
        Err(ApiError::Forbidden(msg)) => {
            log::warn!("❌ Leave rejected for {}: {}", club_id, msg);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "code": "forbidden",
                "error": msg
            }))
        }
        Err(e) => {
            log::warn!("❌ Leave failed for {}: {}", club_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/clubs/{club_id}",
    tag = "Clubs",
    responses(
        (status = 200, description = "Club and its content deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only the creator can delete"),
        (status = 404, description = "Club not found")
    )
)]
pub async fn delete_club(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    path: web::Path<String>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let club_id = path.into_inner();
    log::info!("🗑️ DELETE /api/clubs/{} - user: {}", club_id, user.user_id);

    match club_service::delete_club(&db, &club_id, &user.user_id).await {
        Ok(()) => {
            log::info!("✅ Club deleted: {}", club_id);
            HttpResponse::Ok().json(serde_json::json!({ "success": true }))
        }
        Err(e) => {
            log::warn!("❌ Failed to delete club {}: {}", club_id, e);
            e.to_response()
        }
    }
}
