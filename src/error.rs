/// Application Error Handling
///
/// One error type for the whole service. Domain errors are grouped by
/// concern, converted into `AppError` with `?`, and rendered into a JSON
/// `ErrorResponse` at the HTTP boundary. Internal detail (which token check
/// failed, upstream messages, database errors) is logged, never returned.

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use tracing::Instrument;

use crate::auth::TokenError;

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::OutOfRange(field) => write!(f, "{} is out of range", field),
        }
    }
}

impl StdError for ValidationError {}

/// Storage errors
#[derive(Debug)]
pub enum DatabaseError {
    QueryExecution(String),
    ConnectionPool(String),
    Corrupted(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::Corrupted(msg) => write!(f, "Stored data is invalid: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Authentication and authorization errors
#[derive(Debug)]
pub enum AuthError {
    /// Unknown email or wrong password at login
    InvalidCredentials,
    /// No bearer token on a protected request
    MissingToken,
    /// Bearer token failed validation
    Unauthorized(TokenError),
    /// Token is valid but its subject no longer resolves to a user
    UserNotFound,
    /// Email already registered
    DuplicateRegistration,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Incorrect email or password"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::Unauthorized(cause) => write!(f, "Token rejected: {}", cause),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::DuplicateRegistration => write!(f, "Email already registered"),
        }
    }
}

impl StdError for AuthError {}

/// Failures talking to the AI or places services
#[derive(Debug)]
pub enum UpstreamError {
    NotConfigured(&'static str),
    Request(String),
    InvalidResponse(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::NotConfigured(service) => write!(f, "{} service is not configured", service),
            UpstreamError::Request(msg) => write!(f, "Upstream request failed: {}", msg),
            UpstreamError::InvalidResponse(msg) => write!(f, "Upstream returned invalid data: {}", msg),
        }
    }
}

impl StdError for UpstreamError {}

// ============================================================================
// UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Upstream(UpstreamError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Upstream(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::QueryExecution(err.to_string())),
        }
    }
}

// ============================================================================
// HTTP RESPONSE MAPPING
// ============================================================================

/// Error body returned to clients
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Id of the failed request; matches its `x-request-id` header and log lines
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Status, client-facing code and client-facing message.
    fn public_parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),

            AppError::Database(DatabaseError::ConnectionPool(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Database service temporarily unavailable".to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error occurred".to_string(),
            ),

            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    "Incorrect email or password".to_string(),
                ),
                // Every token failure looks the same from outside
                AuthError::MissingToken | AuthError::Unauthorized(_) => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Invalid or expired token".to_string(),
                ),
                AuthError::UserNotFound => (
                    StatusCode::NOT_FOUND,
                    "USER_NOT_FOUND",
                    "User not found".to_string(),
                ),
                AuthError::DuplicateRegistration => (
                    StatusCode::BAD_REQUEST,
                    "DUPLICATE_REGISTRATION",
                    "Email already registered".to_string(),
                ),
            },

            AppError::Upstream(UpstreamError::NotConfigured(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                self.to_string(),
            ),
            AppError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "Upstream service error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    /// Build the JSON body for this error under the given request id.
    pub fn to_error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.public_parts();
        let body = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );
        (status, body)
    }

    pub fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Upstream(e) => {
                tracing::error!(request_id = request_id, error = %e, "Upstream service error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = current_request_id();
        self.log_error(&request_id);

        let (status, body) = self.to_error_response(&request_id);

        let mut response = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.public_parts().0
    }
}

// ============================================================================
// REQUEST ID
// ============================================================================

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `fut` as the request `request_id`: errors it renders carry that id
/// and its log events sit under a `request` span with the same id.
pub async fn with_request_id<F: Future>(request_id: String, fut: F) -> F::Output {
    let span = tracing::info_span!("request", request_id = %request_id);
    REQUEST_ID.scope(request_id, fut.instrument(span)).await
}

/// Id of the request being served, or a fresh one outside any request.
pub fn current_request_id() -> String {
    REQUEST_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_token_failures_share_one_public_response() {
        let causes = [
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::Malformed,
            TokenError::MissingSubject,
        ];

        let bodies: Vec<_> = causes
            .into_iter()
            .map(|cause| AppError::Auth(AuthError::Unauthorized(cause)).to_error_response("id"))
            .collect();

        for (status, body) in &bodies {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(body.code, "UNAUTHORIZED");
            assert_eq!(body.message, bodies[0].1.message);
        }

        let (_, missing) = AppError::Auth(AuthError::MissingToken).to_error_response("id");
        assert_eq!(missing.message, bodies[0].1.message);
    }

    #[test]
    fn test_user_not_found_is_404() {
        let err = AppError::Auth(AuthError::UserNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_registration_is_400() {
        let err = AppError::Auth(AuthError::DuplicateRegistration);
        let (status, body) = err.to_error_response("req-1");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Email already registered");
        assert_eq!(body.error_id, "req-1");
    }

    #[test]
    fn test_unauthorized_response_has_bearer_challenge() {
        let err = AppError::Auth(AuthError::InvalidCredentials);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_upstream_detail_is_hidden() {
        let err = AppError::Upstream(UpstreamError::Request("secret-host:443 refused".to_string()));
        let (status, body) = err.to_error_response("id");
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.message.contains("secret-host"));
    }

    #[tokio::test]
    async fn test_error_id_is_the_scoped_request_id() {
        let response = with_request_id("req-42".to_string(), async {
            AppError::Auth(AuthError::UserNotFound).error_response()
        })
        .await;

        let bytes = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error_id"], "req-42");
    }

    #[test]
    fn test_request_id_outside_a_request_is_fresh() {
        let first = current_request_id();
        let second = current_request_id();

        assert!(uuid::Uuid::parse_str(&first).is_ok());
        assert_ne!(first, second);
    }
}
