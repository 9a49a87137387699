use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            Interests, InterestsResponse, LoginRequest, LoginResponse, PublicUser,
            SetInterestsRequest, SetInterestsResponse, SignupRequest, VerifyOtpRequest,
        },
        jwt::JwtKeys,
        otp,
        password::{hash_password, verify_password},
        repo_types::{PendingSignup, User},
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/login", post(login))
        .route("/auth/set-interests", put(set_interests))
        .route("/auth/get-interests/:user_id", get(get_interests))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Stage the signup and send an OTP. No user row is created here; the
/// staged registration outlives a failed email send on purpose.
#[instrument(skip(state, payload))]
async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("All fields are required.".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email address.".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "signup for registered email");
        return Err(ApiError::Conflict(
            "User already registered. Please log in.".into(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    PendingSignup::stage(
        &state.db,
        &payload.email,
        &payload.username,
        &password_hash,
        state.config.pending_signup_ttl_minutes,
    )
    .await?;

    let code = otp::generate_code();
    otp::save_code(&state.db, &payload.email, &code, state.config.otp_ttl_minutes).await?;

    let body = otp::email_body(&code, state.config.otp_ttl_minutes);
    if let Err(e) = state
        .mailer
        .send(&payload.email, otp::EMAIL_SUBJECT, &body)
        .await
    {
        // The staged signup and code stay; the user may retry signup.
        error!(error = %e, email = %payload.email, "otp email send failed");
        return Err(ApiError::Upstream(
            "Error sending OTP. Please try again later.".into(),
        ));
    }

    info!(email = %payload.email, "otp sent, signup staged");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "OTP sent to your email for verification." })),
    ))
}

/// Consume the OTP and finalize registration. Exactly one user row per
/// verified email; the code is single-use.
#[instrument(skip(state, payload))]
async fn verify_otp(
    State(state): State<AppState>,
    Json(mut payload): Json<VerifyOtpRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.otp.is_empty() {
        return Err(ApiError::Validation("Email and OTP are required.".into()));
    }

    if !otp::consume_code(&state.db, &payload.email, &payload.otp).await? {
        warn!(email = %payload.email, "otp verification failed");
        return Err(ApiError::Validation(
            "Invalid or expired OTP. Please try again.".into(),
        ));
    }

    let Some(staged) = PendingSignup::find_live(&state.db, &payload.email).await? else {
        return Err(ApiError::Validation(
            "User details not found. Please sign up again.".into(),
        ));
    };

    let user = match User::create(&state.db, &staged.username, &staged.email, &staged.password_hash)
        .await
    {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "username or email taken at finalize");
            return Err(ApiError::Conflict("Email or username already taken.".into()));
        }
        Err(e) => return Err(e.into()),
    };

    PendingSignup::remove(&state.db, &payload.email).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Account created successfully. Please log in." })),
    ))
}

/// Unknown email and wrong password return the same response so accounts
/// cannot be enumerated.
#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !user.email_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(ApiError::EmailUnverified);
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let interests_needed = !user.interests_set;
    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        user: PublicUser {
            username: user.username,
            email: user.email,
            interests_set: user.interests_set,
            interests: Interests {
                categories: user.interest_categories,
                subcategories: user.interest_subcategories,
            },
        },
        interests_needed,
    }))
}

#[instrument(skip(state, payload))]
async fn set_interests(
    State(state): State<AppState>,
    Json(payload): Json<SetInterestsRequest>,
) -> Result<Json<SetInterestsResponse>, ApiError> {
    let updated = User::set_interests(
        &state.db,
        payload.user_id,
        &payload.categories,
        &payload.subcategories,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %updated.id, "interests updated");
    Ok(Json(SetInterestsResponse {
        msg: "Interests updated successfully".into(),
        interests: Interests {
            categories: updated.interest_categories,
            subcategories: updated.interest_subcategories,
        },
    }))
}

#[instrument(skip(state))]
async fn get_interests(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<InterestsResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(InterestsResponse {
        interests: Interests {
            categories: user.interest_categories,
            subcategories: user.interest_subcategories,
        },
    }))
}
