use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Itinerary, ItineraryStore, NewItinerary, User, UserStore};
use crate::error::{AppError, AuthError};

/// In-process store for local runs and tests. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    // Insertion order is creation order
    itineraries: RwLock<Vec<Itinerary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Internal("memory store lock poisoned".to_string())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(email).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.contains_key(email) {
            return Err(AuthError::DuplicateRegistration.into());
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ItineraryStore for MemoryStore {
    async fn save_itinerary(&self, itinerary: NewItinerary) -> Result<Itinerary, AppError> {
        let saved = Itinerary {
            id: Uuid::new_v4(),
            user_id: itinerary.user_id,
            destination: itinerary.destination,
            days: itinerary.days,
            plan: itinerary.plan,
            created_at: Utc::now(),
        };

        self.itineraries.write().map_err(poisoned)?.push(saved.clone());
        Ok(saved)
    }

    async fn list_itineraries(&self, user_id: Uuid) -> Result<Vec<Itinerary>, AppError> {
        let itineraries = self.itineraries.read().map_err(poisoned)?;
        Ok(itineraries
            .iter()
            .rev()
            .filter(|it| it.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = MemoryStore::new();
        let created = store.create_user("a@b.com", "$2b$04$hash").await.unwrap();

        let found = store.find_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "$2b$04$hash");
        assert!(store.find_user_by_email("x@y.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let store = MemoryStore::new();
        store.create_user("a@b.com", "h1").await.unwrap();

        let err = store.create_user("a@b.com", "h2").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::DuplicateRegistration)));
    }

    #[tokio::test]
    async fn test_itineraries_are_per_user_and_newest_first() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for (user_id, destination) in [(alice, "Pune"), (bob, "Goa"), (alice, "Jaipur")] {
            store
                .save_itinerary(NewItinerary {
                    user_id,
                    destination: destination.to_string(),
                    days: 2,
                    plan: json!([]),
                })
                .await
                .unwrap();
        }

        let mine = store.list_itineraries(alice).await.unwrap();
        let names: Vec<_> = mine.iter().map(|it| it.destination.as_str()).collect();
        assert_eq!(names, vec!["Jaipur", "Pune"]);
        assert!(store.list_itineraries(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
