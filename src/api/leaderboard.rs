use actix_web::{web, HttpResponse};

use crate::{database::MongoDB, services::content_service};

#[utoipa::path(
    get,
    path = "/api/clubs/{club_id}/leaderboard",
    tag = "Leaderboard",
    responses(
        (status = 200, description = "Leaderboard entries by points descending")
    )
)]
pub async fn get_leaderboard(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let club_id = path.into_inner();

    match content_service::list_leaderboard(&db, &club_id).await {
        Ok(leaderboard) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "leaderboard": leaderboard
        })),
        Err(e) => {
            log::error!("❌ Failed to list leaderboard for {}: {}", club_id, e);
            e.to_response()
        }
    }
}
