/// Persistence
///
/// Handlers only see the `UserStore` and `ItineraryStore` traits. `PgStore`
/// backs them with Postgres, `MemoryStore` with process memory.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A registered user. Identity is the email address.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Itinerary as stored and as returned by `/api/itinerary/my`
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub destination: String,
    pub days: i32,
    pub plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewItinerary {
    pub user_id: Uuid,
    pub destination: String,
    pub days: i32,
    pub plan: serde_json::Value,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// # Errors
    /// `AuthError::DuplicateRegistration` if the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait ItineraryStore: Send + Sync {
    async fn save_itinerary(&self, itinerary: NewItinerary) -> Result<Itinerary, AppError>;

    /// All itineraries of `user_id`, newest first
    async fn list_itineraries(&self, user_id: Uuid) -> Result<Vec<Itinerary>, AppError>;
}
