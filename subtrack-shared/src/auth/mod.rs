/// Authentication utilities
///
/// This module provides the authentication primitives for SubTrack:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT token generation and validation, plus the [`jwt::Identity`]
///   value the API derives from validated claims
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing with configurable expiration
/// - **Constant-time Comparison**: password verification is constant-time
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use subtrack_shared::auth::jwt::{create_token, validate_token, Claims};
/// use subtrack_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // JWT token generation
/// let claims = Claims::new(7, "jdoe".to_string(), Duration::minutes(60));
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
