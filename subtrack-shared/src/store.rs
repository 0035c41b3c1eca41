/// Storage contract and PostgreSQL implementation
///
/// This module defines the [`SubscriptionStore`] trait the orchestration
/// layer is written against, and [`PgStore`], its production implementation
/// over a sqlx connection pool.
///
/// # Store Contract
///
/// All implementations must:
/// 1. Keep read operations side-effect-free
/// 2. Make each write atomic at the single-record level
/// 3. Report a missing record as `Ok(None)` / `Ok(false)`, never as an error
/// 4. Reserve [`StoreError::Database`] for transport/persistence faults
///
/// The distinction in (3)/(4) is what lets the retry executor tell
/// transient faults apart from logically false preconditions.
///
/// # Example
///
/// ```no_run
/// use subtrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use subtrack_shared::store::{PgStore, SubscriptionStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let subs = store.list_subscriptions_by_user(7).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::subscription::{NewSubscription, Subscription, SubscriptionUpdate};
use crate::models::user::{NewUser, User};
use crate::retry::Retryable;

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced record is absent (e.g. foreign key violation)
    #[error("referenced record not found: {0}")]
    InvalidReference(String),

    /// Underlying database fault (connection, timeout, protocol)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Retryable for StoreError {
    /// Only raw database faults are worth retrying. Constraint violations
    /// are deterministic and will fail identically on every attempt.
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Database(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage contract for users and subscriptions
///
/// The orchestration layer holds this as a trait object, so tests can swap
/// in an in-memory double without a database.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts a subscription and returns it with its assigned identity
    async fn create_subscription(&self, data: NewSubscription) -> StoreResult<Subscription>;

    /// Finds a subscription by ID
    async fn find_subscription(&self, subscription_id: i32) -> StoreResult<Option<Subscription>>;

    /// Full-replaces a subscription's mutable fields; None when absent
    async fn update_subscription(
        &self,
        subscription_id: i32,
        data: SubscriptionUpdate,
    ) -> StoreResult<Option<Subscription>>;

    /// Physically deletes a subscription; false when absent
    async fn delete_subscription(&self, subscription_id: i32) -> StoreResult<bool>;

    /// Lists subscriptions whose date window contains `on` (inclusive)
    async fn list_active_subscriptions(&self, on: NaiveDate) -> StoreResult<Vec<Subscription>>;

    /// Lists subscriptions owned by the given user
    async fn list_subscriptions_by_user(&self, user_id: i32) -> StoreResult<Vec<Subscription>>;

    /// Inserts a user and returns it with its assigned identity
    async fn create_user(&self, data: NewUser) -> StoreResult<User>;

    /// Finds a user by username; credential checks happen in the caller
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

/// PostgreSQL-backed store over a shared connection pool
///
/// Cloning is cheap; the pool is internally reference-counted and safe for
/// concurrent use from many requests.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Maps constraint violations onto typed store errors
    ///
    /// Unique violations become `Conflict`, foreign key violations become
    /// `InvalidReference`; anything else stays a `Database` fault and is
    /// therefore eligible for retry.
    fn map_write_error(err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(constraint) = db_err.constraint() {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict(format!("constraint {constraint}"));
                }
                if db_err.is_foreign_key_violation() {
                    return StoreError::InvalidReference(format!("constraint {constraint}"));
                }
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn create_subscription(&self, data: NewSubscription) -> StoreResult<Subscription> {
        Subscription::create(&self.pool, data)
            .await
            .map_err(Self::map_write_error)
    }

    async fn find_subscription(&self, subscription_id: i32) -> StoreResult<Option<Subscription>> {
        Ok(Subscription::find_by_id(&self.pool, subscription_id).await?)
    }

    async fn update_subscription(
        &self,
        subscription_id: i32,
        data: SubscriptionUpdate,
    ) -> StoreResult<Option<Subscription>> {
        Subscription::update(&self.pool, subscription_id, data)
            .await
            .map_err(Self::map_write_error)
    }

    async fn delete_subscription(&self, subscription_id: i32) -> StoreResult<bool> {
        Ok(Subscription::delete(&self.pool, subscription_id).await?)
    }

    async fn list_active_subscriptions(&self, on: NaiveDate) -> StoreResult<Vec<Subscription>> {
        Ok(Subscription::list_active_on(&self.pool, on).await?)
    }

    async fn list_subscriptions_by_user(&self, user_id: i32) -> StoreResult<Vec<Subscription>> {
        Ok(Subscription::list_by_user(&self.pool, user_id).await?)
    }

    async fn create_user(&self, data: NewUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(Self::map_write_error)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_terminal() {
        let err = StoreError::Conflict("users_username_key".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_reference_is_terminal() {
        let err = StoreError::InvalidReference("subscriptions_user_id_fkey".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_database_fault_is_retryable() {
        let err = StoreError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
    }

    // PgStore behavior against a live database is covered by the service
    // layer's in-memory double plus deployment smoke tests.
}
