use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interest selection as stored on the user and echoed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interests {
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
}

/// Request body for signup; the account is created only after OTP
/// verification.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for OTP verification.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned on login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub username: String,
    pub email: String,
    pub interests_set: bool,
    pub interests: Interests,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub user: PublicUser,
    /// Tells the client to route into interest selection first.
    pub interests_needed: bool,
}

/// Request body for interest selection after first login.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInterestsRequest {
    pub user_id: Uuid,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SetInterestsResponse {
    pub msg: String,
    pub interests: Interests,
}

#[derive(Debug, Serialize)]
pub struct InterestsResponse {
    pub interests: Interests,
}
