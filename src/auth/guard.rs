/// Request Authorization
///
/// `authenticate` is the single gate between a bearer token and a user
/// record. `AuthenticatedUser` runs it for every handler that asks for one.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::auth::jwt::TokenService;
use crate::error::{AppError, AuthError};
use crate::store::{User, UserStore};

/// Resolve `token` to a user.
///
/// # Errors
/// - `AuthError::Unauthorized` if the token fails validation (cause kept for logs)
/// - `AuthError::UserNotFound` if the subject is not a registered user
/// - store errors as they come
pub async fn authenticate<S>(
    tokens: &TokenService,
    token: &str,
    now: DateTime<Utc>,
    lookup: &S,
) -> Result<User, AppError>
where
    S: UserStore + ?Sized,
{
    let identity = tokens
        .validate(token, now)
        .map_err(AuthError::Unauthorized)?;

    lookup
        .find_user_by_email(&identity)
        .await?
        .ok_or_else(|| AuthError::UserNotFound.into())
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| {
            let (scheme, token) = h.split_once(' ')?;
            let token = token.trim();
            (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
        })
}

/// The user behind the request's bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Id of the authenticated user, left in the request extensions for the
/// request logger.
#[derive(Debug, Clone, Copy)]
pub struct RequestUser(pub Uuid);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let tokens = req.app_data::<web::Data<TokenService>>().cloned();
        let users = req.app_data::<web::Data<dyn UserStore>>().cloned();
        let req = req.clone();

        Box::pin(async move {
            let (tokens, users) = match (tokens, users) {
                (Some(tokens), Some(users)) => (tokens, users),
                _ => {
                    return Err(AppError::Internal(
                        "token service or user store not registered".to_string(),
                    ))
                }
            };

            let token = token.ok_or(AuthError::MissingToken)?;
            let user = authenticate(tokens.get_ref(), &token, Utc::now(), users.get_ref()).await?;

            tracing::debug!(user_id = %user.id, "Request authenticated");
            req.extensions_mut().insert(RequestUser(user.id));
            Ok(AuthenticatedUser(user))
        })
    }
}
