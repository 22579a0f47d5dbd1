use serde::{Deserialize, Serialize};
use time::Date;

use crate::users::model::{Gender, SortKey, UserRecord};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub gender: Gender,
}

/// Request body for replacing the caller's profile.
#[derive(Debug, Deserialize)]
pub struct PutUserRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub from_date: Date,
    pub to_date: Date,
}

#[derive(Debug, Deserialize)]
pub struct GenderQuery {
    pub gender: Gender,
}

#[derive(Debug, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    pub key: SortKey,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}
fn default_ascending() -> bool { true }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}
fn default_page_number() -> i64 { 1 }
fn default_page_size() -> i64 { 20 }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    #[serde(default)]
    pub start_inclusive: i64,
    #[serde(default)]
    pub end_exclusive: i64,
}
