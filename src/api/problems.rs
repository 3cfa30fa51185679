use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::{require_auth, AuthedUser},
    services::content_service,
    services::content_service::CreateProblemRequest,
};

#[utoipa::path(
    post,
    path = "/api/clubs/{club_id}/problems",
    tag = "Problems",
    request_body = CreateProblemRequest,
    responses(
        (status = 200, description = "Problem created"),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a club admin"),
        (status = 404, description = "Club not found")
    )
)]
pub async fn add_problem(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
    path: web::Path<String>,
    request: web::Json<CreateProblemRequest>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let club_id = path.into_inner();
    log::info!("🧩 POST /api/clubs/{}/problems - title: {}", club_id, request.title);

    match content_service::add_problem(&db, &club_id, &user.user_id, &request).await {
        Ok(problem_id) => {
            log::info!("✅ Problem created: {}", problem_id);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "problemId": problem_id
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to add problem in {}: {}", club_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/clubs/{club_id}/problems",
    tag = "Problems",
    responses(
        (status = 200, description = "Problems, newest first")
    )
)]
pub async fn get_problems(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let club_id = path.into_inner();

    match content_service::list_problems(&db, &club_id).await {
        Ok(problems) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "problems": problems
        })),
        Err(e) => {
            log::error!("❌ Failed to list problems for {}: {}", club_id, e);
            e.to_response()
        }
    }
}
