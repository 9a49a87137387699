use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Verified user record. A row exists only after OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, never exposed in JSON
    pub email_verified: bool,
    pub interests_set: bool,
    pub interest_categories: Vec<String>,
    pub interest_subcategories: Vec<String>,
    pub created_at: OffsetDateTime,
}

/// Signup waiting for OTP confirmation. Durable so verification survives a
/// restart; rows past `expires_at` are treated as absent and swept.
#[derive(Debug, Clone, FromRow)]
pub struct PendingSignup {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
