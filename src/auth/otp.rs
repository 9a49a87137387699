use rand::Rng;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Uniform 6-digit numeric code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Persist a code for `email`, replacing any live one. At most one code per
/// email exists at a time.
pub async fn save_code(
    db: &PgPool,
    email: &str,
    code: &str,
    ttl_minutes: i64,
) -> anyhow::Result<()> {
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
    sqlx::query(
        r#"
        INSERT INTO email_otps (email, code, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (email)
        DO UPDATE SET code = $2, expires_at = $3, created_at = now()
        "#,
    )
    .bind(email)
    .bind(code)
    .bind(expires_at)
    .execute(db)
    .await?;
    debug!(%email, "otp stored");
    Ok(())
}

/// Atomically consume the code: deleted iff the exact (email, code) pair
/// exists and is unexpired. Returns false otherwise; a consumed code cannot
/// be used twice.
pub async fn consume_code(db: &PgPool, email: &str, code: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM email_otps
        WHERE email = $1 AND code = $2 AND expires_at > now()
        "#,
    )
    .bind(email)
    .bind(code)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub fn email_body(code: &str, ttl_minutes: i64) -> String {
    format!(
        "Your OTP code is: {}. This code is valid for {} minutes.",
        code, ttl_minutes
    )
}

pub const EMAIL_SUBJECT: &str = "Your OTP Code";
