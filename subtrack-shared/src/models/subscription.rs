/// Subscription model and database operations
///
/// This module provides the Subscription model and its CRUD operations,
/// plus the two derived queries the API exposes: subscriptions owned by a
/// user, and subscriptions active on a given date.
///
/// A subscription is *active* on date `d` when `start_date <= d <= end_date`
/// with both bounds truncated to calendar dates (inclusive on both ends).
/// The window comparison therefore casts the stored timestamps with
/// `::date` so a subscription ending at 23:59 and one ending at 00:00 on
/// the same day are treated identically.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscriptions (
///     subscription_id SERIAL PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users (user_id),
///     start_date TIMESTAMPTZ NOT NULL,
///     end_date TIMESTAMPTZ NOT NULL,
///     subscription_type VARCHAR(255) NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use subtrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use subtrack_shared::models::subscription::{NewSubscription, Subscription};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let sub = Subscription::create(
///     &pool,
///     NewSubscription {
///         user_id: 7,
///         start_date: Utc::now(),
///         end_date: Utc::now() + chrono::Duration::days(30),
///         subscription_type: "premium".to_string(),
///     },
/// )
/// .await?;
///
/// let active = Subscription::list_active_on(&pool, Utc::now().date_naive()).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Subscription record owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    /// Unique subscription ID, assigned by the database on insert
    pub subscription_id: i32,

    /// Owning user (foreign key to `users.user_id`)
    pub user_id: i32,

    /// Start of the subscription window (inclusive)
    pub start_date: DateTime<Utc>,

    /// End of the subscription window (inclusive)
    pub end_date: DateTime<Utc>,

    /// Subscription type label (e.g. "premium"), non-empty
    pub subscription_type: String,
}

/// Input for creating a new subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    /// Owning user ID
    pub user_id: i32,

    /// Start of the subscription window (inclusive)
    pub start_date: DateTime<Utc>,

    /// End of the subscription window (inclusive)
    pub end_date: DateTime<Utc>,

    /// Subscription type label
    pub subscription_type: String,
}

/// Full-replace update of a subscription's mutable fields
///
/// Updates have no partial-patch semantics: every field is replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    /// New owning user ID
    pub user_id: i32,

    /// New window start (inclusive)
    pub start_date: DateTime<Utc>,

    /// New window end (inclusive)
    pub end_date: DateTime<Utc>,

    /// New subscription type label
    pub subscription_type: String,
}

impl Subscription {
    /// Creates a new subscription in the database
    ///
    /// # Returns
    ///
    /// The newly created subscription with its assigned ID
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The owning user does not exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: NewSubscription) -> Result<Self, sqlx::Error> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, start_date, end_date, subscription_type)
            VALUES ($1, $2, $3, $4)
            RETURNING subscription_id, user_id, start_date, end_date, subscription_type
            "#,
        )
        .bind(data.user_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.subscription_type)
        .fetch_one(pool)
        .await?;

        Ok(subscription)
    }

    /// Finds a subscription by ID
    ///
    /// # Returns
    ///
    /// The subscription if found, None otherwise
    pub async fn find_by_id(
        pool: &PgPool,
        subscription_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT subscription_id, user_id, start_date, end_date, subscription_type
            FROM subscriptions
            WHERE subscription_id = $1
            "#,
        )
        .bind(subscription_id)
        .fetch_optional(pool)
        .await?;

        Ok(subscription)
    }

    /// Replaces all mutable fields of an existing subscription
    ///
    /// # Returns
    ///
    /// The updated subscription if found, None if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the new owning user does not exist or the
    /// database connection fails
    pub async fn update(
        pool: &PgPool,
        subscription_id: i32,
        data: SubscriptionUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET user_id = $2,
                start_date = $3,
                end_date = $4,
                subscription_type = $5
            WHERE subscription_id = $1
            RETURNING subscription_id, user_id, start_date, end_date, subscription_type
            "#,
        )
        .bind(subscription_id)
        .bind(data.user_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.subscription_type)
        .fetch_optional(pool)
        .await?;

        Ok(subscription)
    }

    /// Deletes a subscription by ID
    ///
    /// Deletion is physical; there is no soft-delete.
    ///
    /// # Returns
    ///
    /// True if a subscription was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, subscription_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE subscription_id = $1")
            .bind(subscription_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all subscriptions owned by a user
    ///
    /// # Returns
    ///
    /// Vector of subscriptions, ordered by ID
    pub async fn list_by_user(pool: &PgPool, user_id: i32) -> Result<Vec<Self>, sqlx::Error> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT subscription_id, user_id, start_date, end_date, subscription_type
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY subscription_id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(subscriptions)
    }

    /// Lists all subscriptions active on the given date
    ///
    /// Active means `start_date::date <= on <= end_date::date`, inclusive on
    /// both ends. The reference date is passed in rather than read from the
    /// database clock so callers (and tests) control "now".
    ///
    /// # Returns
    ///
    /// Vector of subscriptions active on `on`, ordered by ID
    pub async fn list_active_on(pool: &PgPool, on: NaiveDate) -> Result<Vec<Self>, sqlx::Error> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT subscription_id, user_id, start_date, end_date, subscription_type
            FROM subscriptions
            WHERE start_date::date <= $1
              AND end_date::date >= $1
            ORDER BY subscription_id
            "#,
        )
        .bind(on)
        .fetch_all(pool)
        .await?;

        Ok(subscriptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_subscription_struct() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();

        let data = NewSubscription {
            user_id: 7,
            start_date: start,
            end_date: end,
            subscription_type: "premium".to_string(),
        };

        assert_eq!(data.user_id, 7);
        assert_eq!(data.subscription_type, "premium");
        assert!(data.start_date <= data.end_date);
    }

    #[test]
    fn test_subscription_serde_roundtrip() {
        let subscription = Subscription {
            subscription_id: 1,
            user_id: 7,
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
            subscription_type: "premium".to_string(),
        };

        let json = serde_json::to_string(&subscription).unwrap();
        let back: Subscription = serde_json::from_str(&json).unwrap();
        assert_eq!(subscription, back);
    }

    // Integration tests for database operations require a live database
}
