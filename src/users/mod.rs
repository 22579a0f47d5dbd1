use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod events;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod repo;
pub mod services;
mod validation;

pub use model::{Gender, NewUser, SortKey, UserChanges, UserFilter, UserRecord};
pub use repo::{UserError, UserRepository, UserResult};
pub use services::UserService;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::account_routes())
        .merge(handlers::query_routes())
}
