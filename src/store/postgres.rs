use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Itinerary, ItineraryStore, NewItinerary, User, UserStore};
use crate::error::{AppError, AuthError, DatabaseError};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create missing tables.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::QueryExecution(e.to_string())))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

type ItineraryRow = (Uuid, Uuid, String, i32, String, DateTime<Utc>);

fn itinerary_from_row(row: ItineraryRow) -> Result<Itinerary, AppError> {
    let (id, user_id, destination, days, plan, created_at) = row;
    let plan = serde_json::from_str(&plan).map_err(|e| {
        AppError::Database(DatabaseError::Corrupted(format!("itinerary {}: {}", id, e)))
    })?;

    Ok(Itinerary {
        id,
        user_id,
        destination,
        days,
        plan,
        created_at,
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, password_hash, created_at)| User {
            id,
            email,
            password_hash,
            created_at,
        }))
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Auth(AuthError::DuplicateRegistration)
            } else {
                AppError::from(e)
            }
        })?;

        Ok(user)
    }
}

#[async_trait]
impl ItineraryStore for PgStore {
    async fn save_itinerary(&self, itinerary: NewItinerary) -> Result<Itinerary, AppError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let plan = serde_json::to_string(&itinerary.plan)
            .map_err(|e| AppError::Internal(format!("Plan serialization failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO itineraries (id, user_id, destination, days, plan, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(itinerary.user_id)
        .bind(&itinerary.destination)
        .bind(itinerary.days)
        .bind(&plan)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Itinerary {
            id,
            user_id: itinerary.user_id,
            destination: itinerary.destination,
            days: itinerary.days,
            plan: itinerary.plan,
            created_at,
        })
    }

    async fn list_itineraries(&self, user_id: Uuid) -> Result<Vec<Itinerary>, AppError> {
        let rows = sqlx::query_as::<_, ItineraryRow>(
            r#"
            SELECT id, user_id, destination, days, plan, created_at
            FROM itineraries
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(itinerary_from_row).collect()
    }
}
