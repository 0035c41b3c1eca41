/// Subscription orchestration service
///
/// This module implements the use cases behind every endpoint. Each use
/// case is a linear pipeline:
///
/// ```text
/// validate input → resolve preconditions → execute-with-retry(store op) → map outcome
/// ```
///
/// The service holds its collaborators explicitly — a [`SubscriptionStore`]
/// trait object and a [`RetryPolicy`] — so tests can run it against an
/// in-memory store with millisecond backoff. Only transient store faults
/// are retried; logical failures (invalid input, not-found, inactive
/// subscription, bad credentials) are terminal and return immediately.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use chrono::Utc;
/// use subtrack_api::service::SubscriptionService;
/// use subtrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use subtrack_shared::retry::RetryPolicy;
/// use subtrack_shared::store::PgStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let service = SubscriptionService::new(Arc::new(PgStore::new(pool)), RetryPolicy::default());
///
/// let days = service.remaining_days(1, Utc::now().date_naive()).await?;
/// # Ok(())
/// # }
/// ```

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use subtrack_shared::auth::password;
use subtrack_shared::domain;
use subtrack_shared::models::subscription::{NewSubscription, Subscription, SubscriptionUpdate};
use subtrack_shared::models::user::{NewUser, User};
use subtrack_shared::retry::{retry_with_backoff, RetryPolicy};
use subtrack_shared::store::{StoreError, StoreResult, SubscriptionStore};

/// Error type for orchestrated use cases
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input; never retried
    #[error("{0}")]
    InvalidInput(String),

    /// Referenced entity absent; never retried
    #[error("{0}")]
    NotFound(String),

    /// Active-set precondition rejected the target subscription
    #[error("subscription {0} is not active")]
    NotActive(i32),

    /// Unknown user or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Uniqueness conflict (e.g. duplicate username)
    #[error("{0}")]
    Conflict(String),

    /// Store kept failing after the full retry budget
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] StoreError),

    /// Fault outside the classified taxonomy
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::InvalidReference(msg) => {
                ServiceError::InvalidInput(format!("invalid reference: {msg}"))
            }
            StoreError::Database(_) => ServiceError::Unavailable(err),
        }
    }
}

/// Fields a caller supplies when creating a subscription
///
/// The owner is not part of this payload: it is always forced from the
/// authenticated caller's identity, overriding any client-supplied value.
#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    /// Start of the subscription window (inclusive)
    pub start_date: DateTime<Utc>,

    /// End of the subscription window (inclusive)
    pub end_date: DateTime<Utc>,

    /// Subscription type label, non-empty
    pub subscription_type: String,
}

/// Orchestrates subscription and user use cases over the store
///
/// Cloning is cheap: the store is shared behind an `Arc` and the policy is
/// a small value copied per instance.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
    retry: RetryPolicy,
}

impl SubscriptionService {
    /// Creates a service over the given store and retry policy
    pub fn new(store: Arc<dyn SubscriptionStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Runs a store operation under the retry policy and lifts the error
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        retry_with_backoff(&self.retry, op)
            .await
            .map_err(ServiceError::from)
    }

    /// Lists all subscriptions owned by a user
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when `user_id <= 0`
    /// - `Unavailable` when the store keeps failing
    #[instrument(skip(self))]
    pub async fn subscriptions_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<Subscription>, ServiceError> {
        if user_id <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid user id provided".to_string(),
            ));
        }

        self.run(|| self.store.list_subscriptions_by_user(user_id))
            .await
    }

    /// Lists all subscriptions active on the given date
    #[instrument(skip(self))]
    pub async fn active_subscriptions(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Subscription>, ServiceError> {
        self.run(|| self.store.list_active_subscriptions(today)).await
    }

    /// Computes remaining days for a subscription
    ///
    /// Pipeline: validate the id, apply the active-set precondition (an
    /// empty active set always passes — see `domain`), resolve the
    /// subscription, then derive the day count. The result may be negative
    /// when the window has already closed.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when `subscription_id <= 0`
    /// - `NotActive` when other subscriptions are active but this one isn't
    /// - `NotFound` when the subscription does not exist
    #[instrument(skip(self))]
    pub async fn remaining_days(
        &self,
        subscription_id: i32,
        today: NaiveDate,
    ) -> Result<i64, ServiceError> {
        if subscription_id <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid subscription id provided".to_string(),
            ));
        }

        let active = self.run(|| self.store.list_active_subscriptions(today)).await?;
        domain::check_active_precondition(subscription_id, &active)
            .map_err(|_| ServiceError::NotActive(subscription_id))?;

        let subscription = self
            .run(|| self.store.find_subscription(subscription_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subscription not found".to_string()))?;

        Ok(domain::remaining_days(&subscription, today))
    }

    /// Creates a subscription owned by the authenticated caller
    ///
    /// The owner is forced to `owner_id` regardless of the request body.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the caller id is non-positive, the window is
    ///   inverted (`start > end`), or the type label is empty
    #[instrument(skip(self, request))]
    pub async fn create_subscription(
        &self,
        owner_id: i32,
        request: SubscriptionRequest,
    ) -> Result<Subscription, ServiceError> {
        if owner_id <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid user id provided".to_string(),
            ));
        }

        validate_window(request.start_date, request.end_date)?;
        validate_type_label(&request.subscription_type)?;

        let data = NewSubscription {
            user_id: owner_id,
            start_date: request.start_date,
            end_date: request.end_date,
            subscription_type: request.subscription_type,
        };

        let created = self.run(|| self.store.create_subscription(data.clone())).await?;

        info!(
            subscription_id = created.subscription_id,
            user_id = owner_id,
            "Subscription created"
        );
        Ok(created)
    }

    /// Full-replaces a subscription's mutable fields
    ///
    /// # Errors
    ///
    /// - `InvalidInput` on a non-positive id, inverted window, empty type
    ///   label, or non-positive owner
    /// - `NotFound` when the target does not exist
    #[instrument(skip(self, update))]
    pub async fn update_subscription(
        &self,
        subscription_id: i32,
        update: SubscriptionUpdate,
    ) -> Result<Subscription, ServiceError> {
        if subscription_id <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid subscription id provided".to_string(),
            ));
        }
        if update.user_id <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid user id provided".to_string(),
            ));
        }

        validate_window(update.start_date, update.end_date)?;
        validate_type_label(&update.subscription_type)?;

        let updated = self
            .run(|| self.store.update_subscription(subscription_id, update.clone()))
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subscription not found".to_string()))?;

        info!(subscription_id, "Subscription updated");
        Ok(updated)
    }

    /// Physically deletes a subscription
    ///
    /// Deleting an absent id reports `NotFound` and is never retried, so
    /// repeated deletes stay idempotent in outcome.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when `subscription_id <= 0`
    /// - `NotFound` when the target does not exist
    #[instrument(skip(self))]
    pub async fn delete_subscription(&self, subscription_id: i32) -> Result<(), ServiceError> {
        if subscription_id <= 0 {
            return Err(ServiceError::InvalidInput(
                "Invalid subscription id provided".to_string(),
            ));
        }

        let deleted = self
            .run(|| self.store.delete_subscription(subscription_id))
            .await?;

        if !deleted {
            return Err(ServiceError::NotFound(
                "Subscription not found".to_string(),
            ));
        }

        info!(subscription_id, "Subscription deleted");
        Ok(())
    }

    /// Registers a new user with a hashed credential
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the password fails the strength check
    /// - `Conflict` when the username is already taken
    #[instrument(skip(self, raw_password))]
    pub async fn register_user(
        &self,
        username: String,
        email: String,
        raw_password: &str,
    ) -> Result<User, ServiceError> {
        password::validate_password_strength(raw_password).map_err(ServiceError::InvalidInput)?;

        let password_hash = password::hash_password(raw_password)
            .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {e}")))?;

        let data = NewUser {
            username,
            password_hash,
            email,
        };

        let user = self.run(|| self.store.create_user(data.clone())).await?;

        info!(user_id = user.user_id, "User created");
        Ok(user)
    }

    /// Verifies a username/password pair and returns the matching user
    ///
    /// The lookup and the hash verification both fail with the same
    /// `InvalidCredentials` error so callers cannot probe for usernames.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when either field is empty
    /// - `InvalidCredentials` on unknown username or wrong password
    #[instrument(skip(self, raw_password))]
    pub async fn authenticate(
        &self,
        username: &str,
        raw_password: &str,
    ) -> Result<User, ServiceError> {
        if username.is_empty() || raw_password.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Invalid credentials provided".to_string(),
            ));
        }

        let user = self
            .run(|| self.store.find_user_by_username(username))
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let valid = password::verify_password(raw_password, &user.password_hash)
            .map_err(|e| ServiceError::Internal(format!("Password verification failed: {e}")))?;

        if !valid {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Rejects inverted date windows
fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ServiceError> {
    if start > end {
        return Err(ServiceError::InvalidInput(
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok(())
}

/// Rejects empty subscription type labels
fn validate_type_label(subscription_type: &str) -> Result<(), ServiceError> {
    if subscription_type.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "subscription_type must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory store double, no database required
    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryState>,
    }

    #[derive(Default)]
    struct MemoryState {
        users: HashMap<i32, User>,
        subscriptions: HashMap<i32, Subscription>,
        next_user_id: i32,
        next_subscription_id: i32,
    }

    #[async_trait]
    impl SubscriptionStore for MemoryStore {
        async fn create_subscription(&self, data: NewSubscription) -> StoreResult<Subscription> {
            let mut state = self.inner.lock().unwrap();
            state.next_subscription_id += 1;
            let subscription = Subscription {
                subscription_id: state.next_subscription_id,
                user_id: data.user_id,
                start_date: data.start_date,
                end_date: data.end_date,
                subscription_type: data.subscription_type,
            };
            state
                .subscriptions
                .insert(subscription.subscription_id, subscription.clone());
            Ok(subscription)
        }

        async fn find_subscription(
            &self,
            subscription_id: i32,
        ) -> StoreResult<Option<Subscription>> {
            let state = self.inner.lock().unwrap();
            Ok(state.subscriptions.get(&subscription_id).cloned())
        }

        async fn update_subscription(
            &self,
            subscription_id: i32,
            data: SubscriptionUpdate,
        ) -> StoreResult<Option<Subscription>> {
            let mut state = self.inner.lock().unwrap();
            match state.subscriptions.get_mut(&subscription_id) {
                Some(existing) => {
                    existing.user_id = data.user_id;
                    existing.start_date = data.start_date;
                    existing.end_date = data.end_date;
                    existing.subscription_type = data.subscription_type;
                    Ok(Some(existing.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete_subscription(&self, subscription_id: i32) -> StoreResult<bool> {
            let mut state = self.inner.lock().unwrap();
            Ok(state.subscriptions.remove(&subscription_id).is_some())
        }

        async fn list_active_subscriptions(&self, on: NaiveDate) -> StoreResult<Vec<Subscription>> {
            let state = self.inner.lock().unwrap();
            let mut active: Vec<Subscription> = state
                .subscriptions
                .values()
                .filter(|s| domain::is_active(s, on))
                .cloned()
                .collect();
            active.sort_by_key(|s| s.subscription_id);
            Ok(active)
        }

        async fn list_subscriptions_by_user(&self, user_id: i32) -> StoreResult<Vec<Subscription>> {
            let state = self.inner.lock().unwrap();
            let mut owned: Vec<Subscription> = state
                .subscriptions
                .values()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect();
            owned.sort_by_key(|s| s.subscription_id);
            Ok(owned)
        }

        async fn create_user(&self, data: NewUser) -> StoreResult<User> {
            let mut state = self.inner.lock().unwrap();
            if state.users.values().any(|u| u.username == data.username) {
                return Err(StoreError::Conflict("users_username_key".to_string()));
            }
            state.next_user_id += 1;
            let user = User {
                user_id: state.next_user_id,
                username: data.username,
                password_hash: data.password_hash,
                email: data.email,
                created_at: Utc::now(),
            };
            state.users.insert(user.user_id, user.clone());
            Ok(user)
        }

        async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
            let state = self.inner.lock().unwrap();
            Ok(state
                .users
                .values()
                .find(|u| u.username == username)
                .cloned())
        }
    }

    /// Store double that fails the first `failures` calls with a transient
    /// database fault, then delegates to an inner `MemoryStore`
    struct FlakyStore {
        inner: MemoryStore,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryStore::default(),
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn trip(&self) -> StoreResult<()> {
            if self.calls.fetch_add(1, Ordering::Relaxed) < self.failures {
                Err(StoreError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SubscriptionStore for FlakyStore {
        async fn create_subscription(&self, data: NewSubscription) -> StoreResult<Subscription> {
            self.trip()?;
            self.inner.create_subscription(data).await
        }

        async fn find_subscription(
            &self,
            subscription_id: i32,
        ) -> StoreResult<Option<Subscription>> {
            self.trip()?;
            self.inner.find_subscription(subscription_id).await
        }

        async fn update_subscription(
            &self,
            subscription_id: i32,
            data: SubscriptionUpdate,
        ) -> StoreResult<Option<Subscription>> {
            self.trip()?;
            self.inner.update_subscription(subscription_id, data).await
        }

        async fn delete_subscription(&self, subscription_id: i32) -> StoreResult<bool> {
            self.trip()?;
            self.inner.delete_subscription(subscription_id).await
        }

        async fn list_active_subscriptions(&self, on: NaiveDate) -> StoreResult<Vec<Subscription>> {
            self.trip()?;
            self.inner.list_active_subscriptions(on).await
        }

        async fn list_subscriptions_by_user(&self, user_id: i32) -> StoreResult<Vec<Subscription>> {
            self.trip()?;
            self.inner.list_subscriptions_by_user(user_id).await
        }

        async fn create_user(&self, data: NewUser) -> StoreResult<User> {
            self.trip()?;
            self.inner.create_user(data).await
        }

        async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
            self.trip()?;
            self.inner.find_user_by_username(username).await
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
        }
    }

    fn service() -> SubscriptionService {
        SubscriptionService::new(Arc::new(MemoryStore::default()), fast_policy())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn january_premium() -> SubscriptionRequest {
        SubscriptionRequest {
            start_date: ts(2024, 1, 1),
            end_date: ts(2024, 1, 31),
            subscription_type: "premium".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscriptions_for_user_rejects_non_positive_id() {
        let service = service();

        let err = service.subscriptions_for_user(-1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = service.subscriptions_for_user(0).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_subscriptions_for_user_filters_by_owner() {
        let service = service();

        service.create_subscription(7, january_premium()).await.unwrap();
        service.create_subscription(8, january_premium()).await.unwrap();
        service.create_subscription(7, january_premium()).await.unwrap();

        let owned = service.subscriptions_for_user(7).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|s| s.user_id == 7));
    }

    #[tokio::test]
    async fn test_create_forces_owner_and_round_trips() {
        let service = service();

        let created = service.create_subscription(7, january_premium()).await.unwrap();
        assert_eq!(created.user_id, 7);
        assert!(created.subscription_id > 0);

        // Round-trip: equal on all fields, id assigned by the store
        let found = service
            .subscriptions_for_user(7)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(found.start_date, ts(2024, 1, 1));
        assert_eq!(found.end_date, ts(2024, 1, 31));
        assert_eq!(found.subscription_type, "premium");
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_window() {
        let service = service();

        let request = SubscriptionRequest {
            start_date: ts(2024, 2, 1),
            end_date: ts(2024, 1, 1),
            subscription_type: "premium".to_string(),
        };

        let err = service.create_subscription(7, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_type() {
        let service = service();

        let request = SubscriptionRequest {
            subscription_type: "  ".to_string(),
            ..january_premium()
        };

        let err = service.create_subscription(7, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_owner() {
        let service = service();

        let err = service
            .create_subscription(0, january_premium())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_reflects_replaced_fields() {
        let service = service();

        let created = service.create_subscription(7, january_premium()).await.unwrap();

        let updated = service
            .update_subscription(
                created.subscription_id,
                SubscriptionUpdate {
                    user_id: 9,
                    start_date: ts(2024, 3, 1),
                    end_date: ts(2024, 3, 31),
                    subscription_type: "basic".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.subscription_id, created.subscription_id);
        assert_eq!(updated.user_id, 9);
        assert_eq!(updated.start_date, ts(2024, 3, 1));
        assert_eq!(updated.end_date, ts(2024, 3, 31));
        assert_eq!(updated.subscription_type, "basic");

        // The replacement is visible on subsequent reads
        let owned = service.subscriptions_for_user(9).await.unwrap();
        assert_eq!(owned, vec![updated]);
    }

    #[tokio::test]
    async fn test_update_absent_subscription_is_not_found() {
        let service = service();

        let err = service
            .update_subscription(
                999,
                SubscriptionUpdate {
                    user_id: 7,
                    start_date: ts(2024, 1, 1),
                    end_date: ts(2024, 1, 31),
                    subscription_type: "premium".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_absent_subscription_is_not_found() {
        let service = service();

        let err = service.delete_subscription(999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_repeated_delete_stays_not_found() {
        let service = service();

        let created = service.create_subscription(7, january_premium()).await.unwrap();

        service.delete_subscription(created.subscription_id).await.unwrap();

        // Every further delete reports not-found, never a retried fault
        for _ in 0..3 {
            let err = service
                .delete_subscription(created.subscription_id)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn test_remaining_days_reference_scenario() {
        // start 2024-01-01, end 2024-01-31, "premium", user 7, today the 15th
        let service = service();

        let created = service.create_subscription(7, january_premium()).await.unwrap();

        let today = date(2024, 1, 15);
        let active = service.active_subscriptions(today).await.unwrap();
        assert_eq!(active.len(), 1);

        let days = service
            .remaining_days(created.subscription_id, today)
            .await
            .unwrap();
        assert_eq!(days, 16);
    }

    #[tokio::test]
    async fn test_remaining_days_negative_after_window() {
        let service = service();

        let created = service.create_subscription(7, january_premium()).await.unwrap();

        // Nothing is active in February, so the precondition passes and the
        // count goes negative
        let days = service
            .remaining_days(created.subscription_id, date(2024, 2, 5))
            .await
            .unwrap();
        assert_eq!(days, -5);
    }

    #[tokio::test]
    async fn test_remaining_days_rejects_non_positive_id() {
        let service = service();

        let err = service.remaining_days(0, date(2024, 1, 15)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_remaining_days_absent_with_empty_active_set_is_not_found() {
        // Empty active set passes the precondition for any id; existence is
        // still checked afterwards
        let service = service();

        let err = service
            .remaining_days(999, date(2024, 1, 15))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remaining_days_excluded_from_active_set_rejects() {
        let service = service();

        // An active January subscription...
        service.create_subscription(7, january_premium()).await.unwrap();
        // ...and an expired December one
        let expired = service
            .create_subscription(
                7,
                SubscriptionRequest {
                    start_date: ts(2023, 12, 1),
                    end_date: ts(2023, 12, 31),
                    subscription_type: "basic".to_string(),
                },
            )
            .await
            .unwrap();

        let err = service
            .remaining_days(expired.subscription_id, date(2024, 1, 15))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotActive(_)));
    }

    #[tokio::test]
    async fn test_active_subscriptions_window_membership() {
        let service = service();

        service.create_subscription(7, january_premium()).await.unwrap();

        assert_eq!(service.active_subscriptions(date(2024, 1, 1)).await.unwrap().len(), 1);
        assert_eq!(service.active_subscriptions(date(2024, 1, 31)).await.unwrap().len(), 1);
        assert!(service.active_subscriptions(date(2024, 2, 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        // Three transient faults followed by a success on the 4th attempt
        // must come back as an overall success
        let flaky = Arc::new(FlakyStore::new(3));
        let service = SubscriptionService::new(flaky.clone(), fast_policy());

        let subs = service.subscriptions_for_user(7).await.unwrap();
        assert!(subs.is_empty());
        assert_eq!(flaky.calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_is_unavailable() {
        let flaky = Arc::new(FlakyStore::new(10));
        let service = SubscriptionService::new(flaky.clone(), fast_policy());

        let err = service.subscriptions_for_user(7).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(flaky.calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let service = service();

        let user = service
            .register_user(
                "jdoe".to_string(),
                "jdoe@example.com".to_string(),
                "MyP@ssw0rd!",
            )
            .await
            .unwrap();
        assert!(user.user_id > 0);
        assert!(user.password_hash.starts_with("$argon2id$"));

        let authed = service.authenticate("jdoe", "MyP@ssw0rd!").await.unwrap();
        assert_eq!(authed.user_id, user.user_id);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let service = service();

        service
            .register_user(
                "jdoe".to_string(),
                "jdoe@example.com".to_string(),
                "MyP@ssw0rd!",
            )
            .await
            .unwrap();

        let err = service.authenticate("jdoe", "WrongP@ss1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let service = service();

        let err = service.authenticate("ghost", "MyP@ssw0rd!").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_empty_fields() {
        let service = service();

        let err = service.authenticate("", "password").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = service.authenticate("jdoe", "").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let service = service();

        service
            .register_user(
                "jdoe".to_string(),
                "jdoe@example.com".to_string(),
                "MyP@ssw0rd!",
            )
            .await
            .unwrap();

        let err = service
            .register_user(
                "jdoe".to_string(),
                "other@example.com".to_string(),
                "0therP@ssword",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_weak_password_rejected() {
        let service = service();

        let err = service
            .register_user("jdoe".to_string(), "jdoe@example.com".to_string(), "weak")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
