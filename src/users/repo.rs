use async_trait::async_trait;
use time::Date;

use crate::users::model::{UserChanges, UserFilter, UserRecord};

/// Errors raised by user stores and the operations built on them.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("user with id {id} already exists")]
    Conflict { id: i64 },
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type UserResult<T> = Result<T, UserError>;

/// Storage backend for user records.
///
/// Natural iteration order is insertion order. `find_one`, `find_all` and
/// `range` all follow it, so repeated reads without intervening writes
/// return the same sequence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fresh id, strictly greater than every id issued before.
    async fn next_id(&self) -> UserResult<i64>;

    /// Fails with `Conflict` when the id is taken.
    async fn insert(&self, user: UserRecord) -> UserResult<()>;

    async fn find_by_id(&self, id: i64) -> UserResult<Option<UserRecord>>;

    async fn find_one(&self, filter: &UserFilter) -> UserResult<Option<UserRecord>>;

    async fn find_all(&self, filter: &UserFilter) -> UserResult<Vec<UserRecord>>;

    /// Replaces the mutable fields in one atomic step. `None` if absent.
    async fn update(&self, id: i64, changes: UserChanges) -> UserResult<Option<UserRecord>>;

    /// Fails with `NotFound` when absent.
    async fn remove(&self, id: i64) -> UserResult<UserRecord>;

    async fn count(&self) -> UserResult<usize>;

    async fn min_created_date(&self) -> UserResult<Option<Date>>;

    async fn max_created_date(&self) -> UserResult<Option<Date>>;

    /// Up to `limit` records starting at position `offset`.
    async fn range(&self, offset: usize, limit: usize) -> UserResult<Vec<UserRecord>>;
}
