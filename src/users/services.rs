use std::sync::Arc;

use time::Date;
use tracing::{debug, info};

use crate::users::{
    events::{RegistrationPublisher, UserRegistered},
    model::{Gender, NewUser, SortKey, UserChanges, UserFilter, UserRecord},
    repo::{UserError, UserRepository, UserResult},
};

/// Page size used when the caller asks for a non-positive one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Register/update/delete and read-side queries over any `UserRepository`.
///
/// Paging and range arguments are clamped instead of rejected, so every
/// query is defined for all integer inputs.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    events: Arc<dyn RegistrationPublisher>,
}

fn to_index(n: i64) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX)
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, events: Arc<dyn RegistrationPublisher>) -> Self {
        Self { repo, events }
    }

    pub async fn register(&self, new_user: NewUser) -> UserResult<UserRecord> {
        let id = self.repo.next_id().await?;
        let user = new_user.into_record(id);
        self.repo.insert(user.clone()).await?;

        self.events.publish(UserRegistered {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            created_date: user.created_date,
        });
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> UserResult<UserRecord> {
        let user = self
            .repo
            .update(id, changes)
            .await?
            .ok_or(UserError::NotFound)?;
        info!(user_id = id, updated_date = %user.updated_date, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> UserResult<UserRecord> {
        let user = self.repo.remove(id).await?;
        info!(user_id = id, "user deleted");
        Ok(user)
    }

    /// First user whose email and secret both match exactly.
    pub async fn authenticate(&self, email: &str, password_secret: &str) -> UserResult<UserRecord> {
        let filter = UserFilter::Credentials {
            email: email.to_string(),
            password_secret: password_secret.to_string(),
        };
        self.repo
            .find_one(&filter)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn find(&self, id: i64) -> UserResult<UserRecord> {
        self.repo.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Users with `from <= updated_date <= to`.
    pub async fn by_updated_date_range(&self, from: Date, to: Date) -> UserResult<Vec<UserRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        self.repo
            .find_all(&UserFilter::UpdatedBetween { from, to })
            .await
    }

    pub async fn by_gender(&self, gender: Gender) -> UserResult<Vec<UserRecord>> {
        self.repo.find_all(&UserFilter::Gender(gender)).await
    }

    pub async fn min_registration_date(&self) -> UserResult<Option<Date>> {
        self.repo.min_created_date().await
    }

    pub async fn max_registration_date(&self) -> UserResult<Option<Date>> {
        self.repo.max_created_date().await
    }

    /// All users ordered by `key`. Equal keys keep store order in both directions.
    pub async fn sorted(&self, key: SortKey, ascending: bool) -> UserResult<Vec<UserRecord>> {
        let mut users = self.repo.find_all(&UserFilter::All).await?;
        if ascending {
            users.sort_by(|a, b| key.compare(a, b));
        } else {
            users.sort_by(|a, b| key.compare(b, a));
        }
        Ok(users)
    }

    /// One-based page. `page_number < 1` becomes 1, `page_size < 1` becomes
    /// `DEFAULT_PAGE_SIZE`.
    pub async fn page(&self, page_number: i64, page_size: i64) -> UserResult<Vec<UserRecord>> {
        let page_number = page_number.max(1);
        let page_size = if page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        let offset = (page_number - 1).saturating_mul(page_size);
        debug!(offset, limit = page_size, "users page");
        self.repo.range(to_index(offset), to_index(page_size)).await
    }

    /// Users at positions `[start_inclusive, end_exclusive)`.
    pub async fn range_by_index(
        &self,
        start_inclusive: i64,
        end_exclusive: i64,
    ) -> UserResult<Vec<UserRecord>> {
        let start = start_inclusive.max(0);
        if end_exclusive <= start {
            return Ok(Vec::new());
        }
        self.repo
            .range(to_index(start), to_index(end_exclusive - start))
            .await
    }

    pub async fn total_count(&self) -> UserResult<usize> {
        self.repo.count().await
    }
}
