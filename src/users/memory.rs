use async_trait::async_trait;
use indexmap::IndexMap;
use time::Date;
use tokio::sync::RwLock;
use tracing::debug;

use crate::users::{
    model::{UserChanges, UserFilter, UserRecord},
    repo::{UserError, UserRepository, UserResult},
};

#[derive(Debug)]
struct Inner {
    users: IndexMap<i64, UserRecord>,
    last_id: i64,
}

/// Volatile store keeping records in insertion order.
#[derive(Debug)]
pub struct MemoryUserRepository {
    inner: RwLock<Inner>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: IndexMap::new(),
                last_id: 0,
            }),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn next_id(&self) -> UserResult<i64> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        Ok(inner.last_id)
    }

    async fn insert(&self, user: UserRecord) -> UserResult<()> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id) {
            return Err(UserError::Conflict { id: user.id });
        }
        // keep the counter ahead of ids inserted from outside next_id
        inner.last_id = inner.last_id.max(user.id);
        debug!(user_id = user.id, "memory insert");
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_one(&self, filter: &UserFilter) -> UserResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| filter.matches(u)).cloned())
    }

    async fn find_all(&self, filter: &UserFilter) -> UserResult<Vec<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> UserResult<Option<UserRecord>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn remove(&self, id: i64) -> UserResult<UserRecord> {
        let mut inner = self.inner.write().await;
        inner.users.shift_remove(&id).ok_or(UserError::NotFound)
    }

    async fn count(&self) -> UserResult<usize> {
        Ok(self.inner.read().await.users.len())
    }

    async fn min_created_date(&self) -> UserResult<Option<Date>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().map(|u| u.created_date).min())
    }

    async fn max_created_date(&self) -> UserResult<Option<Date>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().map(|u| u.created_date).max())
    }

    async fn range(&self, offset: usize, limit: usize) -> UserResult<Vec<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::{Gender, NewUser};
    use time::macros::date;

    fn user(id: i64, name: &str) -> UserRecord {
        NewUser {
            email: format!("{name}@example.com"),
            password_secret: "password123".into(),
            username: name.into(),
            gender: Gender::Male,
            created_date: date!(2024 - 01 - 01),
        }
        .into_record(id)
    }

    #[tokio::test]
    async fn next_id_is_never_reused_after_remove() {
        let repo = MemoryUserRepository::new();
        let a = repo.next_id().await.unwrap();
        repo.insert(user(a, "a")).await.unwrap();
        repo.remove(a).await.unwrap();
        let b = repo.next_id().await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let repo = MemoryUserRepository::new();
        repo.insert(user(1, "a")).await.unwrap();
        let err = repo.insert(user(1, "b")).await.unwrap_err();
        assert!(matches!(err, UserError::Conflict { id: 1 }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_keeps_order_of_remaining_records() {
        let repo = MemoryUserRepository::new();
        for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")] {
            repo.insert(user(id, name)).await.unwrap();
        }
        repo.remove(2).await.unwrap();
        let names: Vec<_> = repo
            .range(0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["a", "c", "d"]);
    }

    #[tokio::test]
    async fn remove_missing_is_not_found() {
        let repo = MemoryUserRepository::new();
        assert!(matches!(repo.remove(9).await, Err(UserError::NotFound)));
    }

    #[tokio::test]
    async fn find_one_returns_first_in_insertion_order() {
        let repo = MemoryUserRepository::new();
        let mut second = user(2, "twin");
        second.email = "first@example.com".into();
        let mut first = user(5, "twin");
        first.email = "other@example.com".into();
        repo.insert(first).await.unwrap();
        repo.insert(second).await.unwrap();
        let found = repo
            .find_one(&UserFilter::Username("twin".into()))
            .await
            .unwrap()
            .expect("a match");
        assert_eq!(found.id, 5);
    }

    #[tokio::test]
    async fn insert_with_external_id_advances_counter() {
        let repo = MemoryUserRepository::new();
        repo.insert(user(40, "x")).await.unwrap();
        assert_eq!(repo.next_id().await.unwrap(), 41);
    }
}
