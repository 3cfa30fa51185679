use actix_web::{web, HttpRequest, HttpResponse};
use crate::{
    database::MongoDB,
    middleware::auth::{require_auth, AuthedUser},
    services::{auth_service, mail_service::Mailer},
    utils::VerificationCodes,
};
use crate::services::auth_service::{
    ForgotPasswordRequest, ResetPasswordRequest, SigninRequest, SignupRequest,
};

#[utoipa::path(
    post,
    path = "/api/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = auth_service::SignupResponse),
        (status = 400, description = "Invalid input or duplicate handle/email")
    )
)]
pub async fn signup(
    db: web::Data<MongoDB>,
    request: web::Json<SignupRequest>,
) -> HttpResponse {
    log::info!("📝 POST /api/signup - handle: {}", request.handle);

    match auth_service::signup(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Signup successful: {}", response.handle);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Signup failed: {} - {}", request.handle, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/signin",
    tag = "Auth",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signin successful", body = auth_service::SigninResponse),
        (status = 400, description = "Unknown handle or wrong password")
    )
)]
pub async fn signin(
    db: web::Data<MongoDB>,
    request: web::Json<SigninRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /api/signin - handle: {}", request.handle);

    match auth_service::signin(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Signin successful: {}", request.handle);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Signin failed: {} - {}", request.handle, e);
            e.to_response()
        }
    }
}

// POST /tokenIsValid - answers a bare true/false
pub async fn token_is_valid(db: web::Data<MongoDB>, req: HttpRequest) -> HttpResponse {
    let token = match req.headers().get("x-auth-token").and_then(|v| v.to_str().ok()) {
        Some(token) => token,
        None => return HttpResponse::Ok().json(false),
    };

    match auth_service::token_is_valid(&db, token).await {
        Ok(valid) => HttpResponse::Ok().json(valid),
        Err(e) => {
            log::error!("❌ Token validation failed: {}", e);
            e.to_response()
        }
    }
}

// GET / - current user record plus the echoed token
pub async fn get_user_data(
    db: web::Data<MongoDB>,
    user: Option<web::ReqData<AuthedUser>>,
) -> HttpResponse {
    let user = match require_auth(user) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match auth_service::get_user_data(&db, &user.user_id, &user.token).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Failed to load user {}: {}", user.user_id, e);
            e.to_response()
        }
    }
}

pub async fn forgot_password(
    db: web::Data<MongoDB>,
    codes: web::Data<VerificationCodes>,
    mailer: web::Data<Mailer>,
    request: web::Json<ForgotPasswordRequest>,
) -> HttpResponse {
    log::info!("📧 POST /api/forgot-password - email: {}", request.email);

    match auth_service::forgot_password(&db, &codes, &mailer, &request).await {
        Ok(()) => {
            log::info!("✅ Verification code sent to {}", request.email);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "msg": "Verification code sent"
            }))
        }
        Err(e) => {
            log::warn!("❌ Forgot password failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}

pub async fn reset_password(
    db: web::Data<MongoDB>,
    codes: web::Data<VerificationCodes>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /api/reset-password - email: {}", request.email);

    match auth_service::reset_password(&db, &codes, &request).await {
        Ok(()) => {
            log::info!("✅ Password reset for {}", request.email);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "msg": "Password has been reset"
            }))
        }
        Err(e) => {
            log::warn!("❌ Password reset failed: {} - {}", request.email, e);
            e.to_response()
        }
    }
}
