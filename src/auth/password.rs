/// Password Hashing and Verification
///
/// bcrypt with a configurable cost. The `_async` variants move the work to
/// the tokio blocking pool; request handlers must use those so one slow hash
/// does not hold up the actix worker.

use std::sync::Arc;

use crate::configuration::HashingSettings;
use crate::error::AppError;

const DECOY_PASSWORD: &str = "decoy-password-never-issued";

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash at the configured cost, verified against when the account does
    /// not exist so both login failures take the same time.
    decoy_hash: Arc<str>,
}

impl PasswordHasher {
    /// # Errors
    /// Returns an internal error if bcrypt rejects the configured cost.
    pub fn new(settings: &HashingSettings) -> Result<Self, AppError> {
        let decoy_hash = bcrypt::hash(DECOY_PASSWORD, settings.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(Self {
            cost: settings.cost,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Salted bcrypt hash of `password`. Blocks for the full bcrypt cost.
    ///
    /// # Errors
    /// Returns an internal error if bcrypt rejects the input.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check `password` against a stored bcrypt hash. Blocks for the cost
    /// recorded in `hash`.
    ///
    /// # Errors
    /// Returns an internal error if `hash` is not a bcrypt hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        bcrypt::verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }

    pub async fn hash_async(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    pub async fn verify_async(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
    }

    /// Full-cost verify for a login whose account does not exist. Always
    /// `false` for real input.
    pub async fn verify_decoy_async(&self, password: String) -> Result<bool, AppError> {
        let decoy = self.decoy_hash.to_string();
        self.verify_async(password, decoy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&HashingSettings { cost: 4 }).unwrap()
    }

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = hasher().hash(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
        assert_eq!(hash.len(), 60);
    }

    #[test]
    fn test_verify_password() {
        let hash = hasher().hash("ValidPassword123").unwrap();

        assert!(hasher().verify("ValidPassword123", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hasher().hash("ValidPassword123").unwrap();

        assert!(!hasher().verify("WrongPassword123", &hash).unwrap());
        assert!(!hasher().verify("", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hasher().hash("same-password").unwrap();
        let second = hasher().hash("same-password").unwrap();

        assert_ne!(first, second);
        assert!(hasher().verify("same-password", &first).unwrap());
        assert!(hasher().verify("same-password", &second).unwrap());
    }

    #[test]
    fn test_cost_is_embedded_in_hash() {
        let hash = hasher().hash("pw12345678").unwrap();
        assert!(hash.starts_with("$2b$04$"));

        // A hash made with another cost still verifies
        let stronger = PasswordHasher::new(&HashingSettings { cost: 5 })
            .unwrap()
            .hash("pw12345678")
            .unwrap();
        assert!(hasher().verify("pw12345678", &stronger).unwrap());
    }

    #[tokio::test]
    async fn test_decoy_verify_runs_at_configured_cost() {
        let hasher = PasswordHasher::new(&HashingSettings { cost: 5 }).unwrap();

        assert!(hasher.decoy_hash.starts_with("$2b$05$"));
        assert!(!hasher.verify_decoy_async("SecurePass123".to_string()).await.unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(hasher().verify("password", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash_async("ValidPassword123".to_string()).await.unwrap();

        assert!(hasher
            .verify_async("ValidPassword123".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!hasher
            .verify_async("Other".to_string(), hash)
            .await
            .unwrap());
    }
}
