use crate::{
    database::MongoDB,
    models::User,
    services::mail_service::Mailer,
    utils::{ApiError, VerificationCodes},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

const USERS: &str = "users";

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub iat: usize,  // issued at
    pub exp: usize,  // expiration
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub handle: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    pub id: String,
    pub handle: String,
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninRequest {
    pub handle: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SigninResponse {
    pub token: String,
    pub id: String,
    pub handle: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub verification_code: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserDataResponse {
    pub id: String,
    pub handle: String,
    pub email: String,
    pub clubs: Vec<String>,
    pub token: String,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "passwordKey".to_string())
}

fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        _ => false,
    }
}

// Generate session token binding the user id
pub fn generate_token(user_id: &str) -> Result<String, ApiError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(30)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify session token
pub fn verify_token(token: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))
}

// User signup
pub async fn signup(db: &MongoDB, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
    let collection = db.collection::<User>(USERS);

    let handle = request.handle.trim().to_string();
    let email = request.email.trim().to_string();

    if handle.is_empty() {
        return Err(ApiError::Validation("Handle is required".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    // Friendly duplicate checks; the unique indexes on handle/email are the
    // actual enforcement under concurrent signups.
    if collection
        .find_one(doc! { "handle": &handle })
        .await
        .map_err(ApiError::database)?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User with same handle already exists!".to_string(),
        ));
    }
    if collection
        .find_one(doc! { "email": &email })
        .await
        .map_err(ApiError::database)?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User with same email already exists!".to_string(),
        ));
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let new_user = User {
        id: None,
        user_id: ObjectId::new().to_hex(),
        handle: handle.clone(),
        email: email.clone(),
        password: hashed_password,
        clubs: vec![],
        created_at: Utc::now(),
    };

    collection.insert_one(&new_user).await.map_err(|e| {
        // Race loser against the unique index still gets a duplicate answer
        if e.to_string().contains("E11000") {
            ApiError::Conflict("User with same handle or email already exists!".to_string())
        } else {
            ApiError::database(e)
        }
    })?;

    Ok(SignupResponse {
        id: new_user.user_id,
        handle,
        email,
    })
}

// User signin
pub async fn signin(db: &MongoDB, request: &SigninRequest) -> Result<SigninResponse, ApiError> {
    let collection = db.collection::<User>(USERS);

    let user = collection
        .find_one(doc! { "handle": &request.handle })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| {
            ApiError::Validation("User with this handle does not exist!".to_string())
        })?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| ApiError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(ApiError::Validation("Incorrect password.".to_string()));
    }

    let token = generate_token(&user.user_id)?;

    Ok(SigninResponse {
        token,
        id: user.user_id,
        handle: user.handle,
        email: user.email,
    })
}

// Signature check plus user existence, for the /tokenIsValid probe
pub async fn token_is_valid(db: &MongoDB, token: &str) -> Result<bool, ApiError> {
    let claims = match verify_token(token) {
        Ok(claims) => claims,
        Err(_) => return Ok(false),
    };

    let collection = db.collection::<User>(USERS);
    let user = collection
        .find_one(doc! { "userId": &claims.sub })
        .await
        .map_err(ApiError::database)?;

    Ok(user.is_some())
}

// Get current user record, echoing the presented token
pub async fn get_user_data(
    db: &MongoDB,
    user_id: &str,
    token: &str,
) -> Result<UserDataResponse, ApiError> {
    let collection = db.collection::<User>(USERS);

    let user = collection
        .find_one(doc! { "userId": user_id })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(UserDataResponse {
        id: user.user_id,
        handle: user.handle,
        email: user.email,
        clubs: user.clubs,
        token: token.to_string(),
    })
}

// Issue a reset code and mail it
pub async fn forgot_password(
    db: &MongoDB,
    codes: &VerificationCodes,
    mailer: &Mailer,
    request: &ForgotPasswordRequest,
) -> Result<(), ApiError> {
    let email = request.email.trim();

    if !is_valid_email(email) {
        return Err(ApiError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }

    let collection = db.collection::<User>(USERS);
    collection
        .find_one(doc! { "email": email })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::NotFound("No account with this email exists!".to_string()))?;

    let code = codes.issue(email);
    mailer.send_verification_code(email, &code).await
}

// Consume a reset code and store the new password hash
pub async fn reset_password(
    db: &MongoDB,
    codes: &VerificationCodes,
    request: &ResetPasswordRequest,
) -> Result<(), ApiError> {
    let email = request.email.trim();

    if request.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    let collection = db.collection::<User>(USERS);
    let user = collection
        .find_one(doc! { "email": email })
        .await
        .map_err(ApiError::database)?
        .ok_or_else(|| ApiError::NotFound("No account with this email exists!".to_string()))?;

    if !codes.verify(email, &request.verification_code) {
        return Err(ApiError::Validation(
            "Invalid or expired verification code".to_string(),
        ));
    }

    let hashed_password = hash(&request.new_password, DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    collection
        .update_one(
            doc! { "userId": &user.user_id },
            doc! { "$set": { "password": hashed_password } },
        )
        .await
        .map_err(ApiError::database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip_binds_user_id() {
        let token = generate_token("user-123").unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = generate_token("user-123").unwrap();
        let mut tampered = token.clone();
        // flip a payload character
        let idx = token.find('.').unwrap() + 2;
        let original = tampered.remove(idx);
        tampered.insert(idx, if original == 'A' { 'B' } else { 'A' });
        assert!(verify_token(&tampered).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(verify_token("not-a-jwt").is_err());
        assert!(verify_token("").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hashed = hash("secret1", 4).unwrap();
        assert!(verify("secret1", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    async fn test_db() -> MongoDB {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/clubhub_test".to_string());
        MongoDB::new(&uri).await.expect("MongoDB must be running")
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn duplicate_signup_is_rejected() {
        let db = test_db().await;
        let request = SignupRequest {
            handle: format!("alice-{}", ObjectId::new().to_hex()),
            email: format!("{}@test.local", ObjectId::new().to_hex()),
            password: "secret1".to_string(),
        };

        signup(&db, &request).await.unwrap();
        let err = signup(&db, &request).await.unwrap_err();
        assert_eq!(err.code(), "conflict");
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn signup_signin_roundtrip() {
        let db = test_db().await;
        let handle = format!("alice-{}", ObjectId::new().to_hex());
        let email = format!("{}@test.local", ObjectId::new().to_hex());

        let created = signup(
            &db,
            &SignupRequest {
                handle: handle.clone(),
                email: email.clone(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(created.handle, handle);

        let session = signin(
            &db,
            &SigninRequest {
                handle: handle.clone(),
                password: "secret1".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(!session.token.is_empty());
        assert_eq!(verify_token(&session.token).unwrap().sub, created.id);

        let err = signin(
            &db,
            &SigninRequest {
                handle,
                password: "wrong".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Incorrect password.");
    }
}
