use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo_types::{PendingSignup, User};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, email_verified, interests_set,
    interest_categories, interest_subcategories, created_at
"#;

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a verified user. Uniqueness of username and email is enforced
    /// by the table constraints; callers inspect the error for conflicts.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, email_verified, interests_set)
            VALUES ($1, $2, $3, TRUE, FALSE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Replace the user's interests and flag the selection as done. Returns
    /// the updated row, or None for an unknown id.
    pub async fn set_interests(
        db: &PgPool,
        id: Uuid,
        categories: &[String],
        subcategories: &[String],
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET interest_categories = $2, interest_subcategories = $3, interests_set = TRUE
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(categories)
        .bind(subcategories)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

impl PendingSignup {
    /// Stage an unverified signup. Last attempt for an email wins.
    pub async fn stage(
        db: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
        ttl_minutes: i64,
    ) -> anyhow::Result<()> {
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
        sqlx::query(
            r#"
            INSERT INTO pending_signups (email, username, password_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email)
            DO UPDATE SET username = $2, password_hash = $3, expires_at = $4, created_at = now()
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Fetch the staged signup for an email; expired rows count as absent.
    pub async fn find_live(db: &PgPool, email: &str) -> anyhow::Result<Option<PendingSignup>> {
        let staged = sqlx::query_as::<_, PendingSignup>(
            r#"
            SELECT email, username, password_hash, expires_at, created_at
            FROM pending_signups
            WHERE email = $1 AND expires_at > now()
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(staged)
    }

    pub async fn remove(db: &PgPool, email: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM pending_signups WHERE email = $1")
            .bind(email)
            .execute(db)
            .await?;
        Ok(())
    }
}

/// Delete expired OTP and pending-signup rows. Called from the periodic
/// sweeper; returns (otps, signups) removed.
pub async fn sweep_expired(db: &PgPool) -> anyhow::Result<(u64, u64)> {
    let otps = sqlx::query("DELETE FROM email_otps WHERE expires_at <= now()")
        .execute(db)
        .await?
        .rows_affected();
    let signups = sqlx::query("DELETE FROM pending_signups WHERE expires_at <= now()")
        .execute(db)
        .await?
        .rows_affected();
    Ok((otps, signups))
}
