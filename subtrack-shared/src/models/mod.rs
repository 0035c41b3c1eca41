/// Database models for SubTrack
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `subscription`: Subscription records with date windows
///
/// # Example
///
/// ```no_run
/// use subtrack_shared::db::pool::{create_pool, DatabaseConfig};
/// use subtrack_shared::models::user::{NewUser, User};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = NewUser {
///     username: "jdoe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     email: "jdoe@example.com".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod subscription;
pub mod user;
