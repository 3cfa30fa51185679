use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-auth-token"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Club Service API",
        version = "1.0.0",
        description = "Backend for the clubs/discussions/problems platform.\n\n**Authentication:** protected endpoints expect the session token in the `x-auth-token` header."
    ),
    paths(
        // Auth
        crate::api::auth::signup,
        crate::api::auth::signin,

        // Clubs
        crate::api::clubs::create_club,
        crate::api::clubs::get_club,
        crate::api::clubs::join_club,
        crate::api::clubs::leave_club,
        crate::api::clubs::delete_club,

        // Club content
        crate::api::discussions::add_discussion,
        crate::api::discussions::get_discussions,
        crate::api::problems::add_problem,
        crate::api::problems::get_problems,
        crate::api::leaderboard::get_leaderboard,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::SignupRequest,
            crate::services::auth_service::SignupResponse,
            crate::services::auth_service::SigninRequest,
            crate::services::auth_service::SigninResponse,
            crate::services::club_service::CreateClubRequest,
            crate::services::content_service::CreateDiscussionRequest,
            crate::services::content_service::CreateProblemRequest,
            crate::api::health::HealthResponse,
        )
    ),
    modifiers(&TokenAuth),
    tags(
        (name = "Auth", description = "Signup, signin and password reset."),
        (name = "Clubs", description = "Club CRUD and membership."),
        (name = "Discussions", description = "Per-club discussion threads."),
        (name = "Problems", description = "Per-club practice problems."),
        (name = "Leaderboard", description = "Per-club standings, read-only."),
        (name = "Health", description = "Service health probe."),
    )
)]
pub struct ApiDoc;
