mod api;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use services::mail_service::Mailer;
use utils::VerificationCodes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let database_url = env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    log::info!("🚀 Starting Club Service...");
    log::info!("📊 Database: {}", database_url);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // Verification codes live in process memory and are shared across workers
    let codes_data = web::Data::new(VerificationCodes::new());

    // A missing mail config degrades forgot-password to a 500, not a crash
    let mailer = Mailer::from_env();
    if !mailer.is_configured() {
        log::warn!("⚠️ MAIL_API_URL/MAIL_API_KEY not set - password reset mails will fail");
    }
    let mailer_data = web::Data::new(mailer);

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(codes_data.clone())
            .app_data(mailer_data.clone())
            .wrap(cors)
            .wrap(middleware::AuthMiddleware)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Auth endpoints
            .route("/api/signup", web::post().to(api::auth::signup))
            .route("/api/signin", web::post().to(api::auth::signin))
            .route("/tokenIsValid", web::post().to(api::auth::token_is_valid))
            .route("/api/forgot-password", web::post().to(api::auth::forgot_password))
            .route("/api/reset-password", web::post().to(api::auth::reset_password))
            .route("/", web::get().to(api::auth::get_user_data))
            // Clubs - /search must be registered before the {club_id} catch-all
            .route("/api/clubs/search", web::get().to(api::clubs::search_clubs))
            .service(
                web::resource("/api/clubs")
                    .route(web::get().to(api::clubs::get_all_clubs))
                    .route(web::post().to(api::clubs::create_club)),
            )
            .service(
                web::resource("/api/clubs/{club_id}")
                    .route(web::get().to(api::clubs::get_club))
                    .route(web::delete().to(api::clubs::delete_club)),
            )
            .route("/api/users/{user_id}/clubs", web::get().to(api::clubs::get_user_clubs))
            // Membership
            .route("/api/clubs/{club_id}/join", web::post().to(api::clubs::join_club))
            .route("/api/clubs/{club_id}/leave", web::post().to(api::clubs::leave_club))
            // Club content
            .service(
                web::resource("/api/clubs/{club_id}/discussions")
                    .route(web::get().to(api::discussions::get_discussions))
                    .route(web::post().to(api::discussions::add_discussion)),
            )
            .service(
                web::resource("/api/clubs/{club_id}/problems")
                    .route(web::get().to(api::problems::get_problems))
                    .route(web::post().to(api::problems::add_problem)),
            )
            .route(
                "/api/clubs/{club_id}/leaderboard",
                web::get().to(api::leaderboard::get_leaderboard),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
