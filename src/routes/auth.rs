/// Authentication Routes
///
/// Registration, login and the current-user lookup.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, PasswordHasher, TokenService};
use crate::error::{AppError, AuthError};
use crate::store::UserStore;
use crate::validators::{is_valid_email, is_valid_password};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant style login form. `username` carries the email.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
}

/// POST /api/auth/register
///
/// # Errors
/// - 400: invalid email or password, or email already registered
/// - 500: hashing or storage failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    if users.find_user_by_email(&email).await?.is_some() {
        return Err(AuthError::DuplicateRegistration.into());
    }

    let password_hash = hasher.hash_async(form.password).await?;
    let user = users.create_user(&email, &password_hash).await?;

    tracing::info!(user_id = %user.id, "User registered successfully");

    Ok(HttpResponse::Created().json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
    }))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password get the same 401 after the same bcrypt
/// work, so neither the body nor the timing tells whether an account exists.
pub async fn login(
    form: web::Form<LoginForm>,
    users: web::Data<dyn UserStore>,
    hasher: web::Data<PasswordHasher>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let email = form.username.trim();

    let user = match users.find_user_by_email(email).await? {
        Some(user) => {
            let valid = hasher
                .verify_async(form.password, user.password_hash.clone())
                .await?;
            valid.then_some(user)
        }
        None => {
            hasher.verify_decoy_async(form.password).await?;
            None
        }
    };
    let user = user.ok_or(AuthError::InvalidCredentials)?;

    let access_token = tokens.issue(&user.email, Utc::now())?;

    tracing::info!(user_id = %user.id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /api/auth/me
pub async fn current_user(user: AuthenticatedUser) -> HttpResponse {
    let AuthenticatedUser(user) = user;
    HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
    })
}
