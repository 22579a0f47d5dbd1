use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{Date, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{AuthUser, JwtKeys},
    state::AppState,
    users::{
        dto::{
            AuthResponse, DateRangeQuery, GenderQuery, LoginRequest, PageQuery, PutUserRequest,
            RangeQuery, RegisterRequest, SortQuery,
        },
        model::{NewUser, UserChanges, UserRecord},
        repo::UserError,
        validation::{check_credentials, check_profile, normalize_email},
    },
};

type ApiError = (StatusCode, String);

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/login", post(login))
        .route("/users/register", post(register))
}

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/users", axum::routing::put(put_user).delete(delete_user))
}

pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/users/by-date-range", get(by_date_range))
        .route("/users/by-gender", get(by_gender))
        .route("/users/sorted", get(sorted))
        .route("/users/stats/registration-date/min", get(min_registration_date))
        .route("/users/stats/registration-date/max", get(max_registration_date))
        .route("/users/stats/count", get(total_count))
        .route("/users/page", get(page))
        .route("/users/range", get(range))
}

fn user_error(e: UserError) -> ApiError {
    match e {
        UserError::NotFound => (StatusCode::NOT_FOUND, "User not found".into()),
        UserError::Conflict { .. } => (StatusCode::CONFLICT, e.to_string()),
        UserError::Storage(ref err) => {
            error!(error = %err, "user store failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn auth_response(state: &AppState, user: UserRecord) -> Result<Json<AuthResponse>, ApiError> {
    let access_token = JwtKeys::from_ref(state).sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(AuthResponse { access_token, user }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);
    if let Err(msg) = check_credentials(&payload.email, &payload.password) {
        warn!(email = %payload.email, msg, "login rejected");
        return Err(bad_request(msg));
    }

    let user = state
        .users
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            if matches!(e, UserError::NotFound) {
                warn!(email = %payload.email, "login unknown credentials");
            }
            user_error(e)
        })?;

    info!(user_id = user.id, "user logged in");
    auth_response(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = normalize_email(&payload.email);
    if let Err(msg) = check_profile(&payload.email, &payload.password, &payload.username) {
        warn!(email = %payload.email, msg, "registration rejected");
        return Err(bad_request(msg));
    }

    let user = state
        .users
        .register(NewUser {
            email: payload.email,
            password_secret: payload.password,
            username: payload.username.trim().to_string(),
            gender: payload.gender,
            created_date: today(),
        })
        .await
        .map_err(user_error)?;

    auth_response(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn put_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<PutUserRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    payload.email = normalize_email(&payload.email);
    if let Err(msg) = check_profile(&payload.email, &payload.password, &payload.username) {
        warn!(user_id, msg, "update rejected");
        return Err(bad_request(msg));
    }

    let user = state
        .users
        .update(
            user_id,
            UserChanges {
                email: payload.email,
                password_secret: payload.password,
                username: payload.username.trim().to_string(),
                updated_date: today(),
            },
        )
        .await
        .map_err(user_error)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.users.delete(user_id).await.map_err(user_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn by_date_range(
    State(state): State<AppState>,
    Query(q): Query<DateRangeQuery>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state
        .users
        .by_updated_date_range(q.from_date, q.to_date)
        .await
        .map_err(user_error)?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn by_gender(
    State(state): State<AppState>,
    Query(q): Query<GenderQuery>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.users.by_gender(q.gender).await.map_err(user_error)?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn sorted(
    State(state): State<AppState>,
    Query(q): Query<SortQuery>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state
        .users
        .sorted(q.key, q.ascending)
        .await
        .map_err(user_error)?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn min_registration_date(
    State(state): State<AppState>,
) -> Result<Json<Option<Date>>, ApiError> {
    let d = state
        .users
        .min_registration_date()
        .await
        .map_err(user_error)?;
    Ok(Json(d))
}

#[instrument(skip(state))]
pub async fn max_registration_date(
    State(state): State<AppState>,
) -> Result<Json<Option<Date>>, ApiError> {
    let d = state
        .users
        .max_registration_date()
        .await
        .map_err(user_error)?;
    Ok(Json(d))
}

#[instrument(skip(state))]
pub async fn total_count(State(state): State<AppState>) -> Result<Json<usize>, ApiError> {
    let n = state.users.total_count().await.map_err(user_error)?;
    Ok(Json(n))
}

#[instrument(skip(state))]
pub async fn page(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state
        .users
        .page(q.page_number, q.page_size)
        .await
        .map_err(user_error)?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn range(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state
        .users
        .range_by_index(q.start_inclusive, q.end_exclusive)
        .await
        .map_err(user_error)?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{Gender, SortKey};

    fn register_body(name: &str) -> RegisterRequest {
        RegisterRequest {
            email: format!("  {}@Example.com ", name.to_uppercase()),
            password: "password123".into(),
            username: name.into(),
            gender: Gender::Female,
        }
    }

    async fn register_user(state: &AppState, name: &str) -> AuthResponse {
        register(State(state.clone()), Json(register_body(name)))
            .await
            .expect("register")
            .0
    }

    #[tokio::test]
    async fn register_normalizes_email_and_issues_token() {
        let state = AppState::fake();
        let resp = register_user(&state, "ann").await;
        assert_eq!(resp.user.email, "ann@example.com");
        assert_eq!(resp.user.created_date, today());
        let claims = JwtKeys::from_ref(&state)
            .verify(&resp.access_token)
            .expect("valid token");
        assert_eq!(claims.sub, resp.user.id);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let state = AppState::fake();
        let mut body = register_body("ann");
        body.password = "short".into();
        let err = register(State(state.clone()), Json(body)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(state.users.total_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_unknown_user_is_not_found() {
        let state = AppState::fake();
        register_user(&state, "ann").await;
        let err = login(
            State(state),
            Json(LoginRequest {
                email: "ann@example.com".into(),
                password: "wrong-password".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_with_registered_credentials() {
        let state = AppState::fake();
        let reg = register_user(&state, "ann").await;
        let resp = login(
            State(state),
            Json(LoginRequest {
                email: "ANN@example.com".into(),
                password: "password123".into(),
            }),
        )
        .await
        .expect("login")
        .0;
        assert_eq!(resp.user.id, reg.user.id);
    }

    #[tokio::test]
    async fn put_and_delete_act_on_caller() {
        let state = AppState::fake();
        let reg = register_user(&state, "ann").await;

        let updated = put_user(
            State(state.clone()),
            AuthUser(reg.user.id),
            Json(PutUserRequest {
                email: "anna@example.com".into(),
                password: "password456".into(),
                username: "anna".into(),
            }),
        )
        .await
        .expect("update")
        .0;
        assert_eq!(updated.username, "anna");
        assert_eq!(updated.created_date, reg.user.created_date);

        let status = delete_user(State(state.clone()), AuthUser(reg.user.id))
            .await
            .expect("delete");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete_user(State(state), AuthUser(reg.user.id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_on_empty_store() {
        let state = AppState::fake();
        let min = min_registration_date(State(state.clone())).await.unwrap().0;
        let max = max_registration_date(State(state.clone())).await.unwrap().0;
        let count = total_count(State(state)).await.unwrap().0;
        assert_eq!(min, None);
        assert_eq!(max, None);
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn page_range_and_sorted_over_http_types() {
        let state = AppState::fake();
        for name in ["carol", "alice", "bob"] {
            register_user(&state, name).await;
        }

        let p = page(
            State(state.clone()),
            Query(PageQuery {
                page_number: 2,
                page_size: 2,
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(p.len(), 1);
        assert_eq!(p[0].username, "bob");

        let r = range(
            State(state.clone()),
            Query(RangeQuery {
                start_inclusive: -1,
                end_exclusive: 2,
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].username, "carol");

        let s = sorted(
            State(state),
            Query(SortQuery {
                key: SortKey::Username,
                ascending: true,
            }),
        )
        .await
        .unwrap()
        .0;
        let names: Vec<_> = s.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[test]
    fn queries_deserialize_with_defaults() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!((q.page_number, q.page_size), (1, 20));
        let q: SortQuery = serde_json::from_str(r#"{"key":"updatedDate"}"#).unwrap();
        assert_eq!(q.key, SortKey::UpdatedDate);
        assert!(q.ascending);
        let q: DateRangeQuery =
            serde_json::from_str(r#"{"fromDate":"2024-01-01","toDate":"2024-01-31"}"#).unwrap();
        assert!(q.from_date < q.to_date);
    }

    #[test]
    fn auth_response_hides_secret() {
        let user = NewUser {
            email: "a@b.io".into(),
            password_secret: "hunter2hunter2".into(),
            username: "a".into(),
            gender: Gender::Male,
            created_date: time::macros::date!(2024 - 01 - 01),
        }
        .into_record(1);
        let json = serde_json::to_string(&AuthResponse {
            access_token: "t".into(),
            user,
        })
        .unwrap();
        assert!(json.contains("\"access_token\":\"t\""));
        assert!(!json.contains("hunter2"));
    }
}
