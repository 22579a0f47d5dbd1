use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::Date;
use tracing::debug;

use crate::users::{
    model::{UserChanges, UserFilter, UserRecord},
    repo::{UserError, UserRepository, UserResult},
};

const COLUMNS: &str = "id, email, password_secret, username, gender, created_date, updated_date";

/// Row as stored in the `users` table.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_secret: String,
    username: String,
    gender: String,
    created_date: Date,
    updated_date: Date,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = UserError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let gender = r
            .gender
            .parse()
            .map_err(|e| UserError::Storage(sqlx::Error::Decode(Box::new(e))))?;
        Ok(Self {
            id: r.id,
            email: r.email,
            password_secret: r.password_secret,
            username: r.username,
            gender,
            created_date: r.created_date,
            updated_date: r.updated_date,
        })
    }
}

fn into_records(rows: Vec<UserRow>) -> UserResult<Vec<UserRecord>> {
    rows.into_iter().map(UserRecord::try_from).collect()
}

/// Durable store backed by Postgres. Id order is insertion order since ids
/// come from a sequence.
#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &UserFilter) {
    match filter {
        UserFilter::All => {}
        UserFilter::Id(id) => {
            qb.push(" WHERE id = ").push_bind(*id);
        }
        UserFilter::Email(email) => {
            qb.push(" WHERE email = ").push_bind(email.clone());
        }
        UserFilter::Username(username) => {
            qb.push(" WHERE username = ").push_bind(username.clone());
        }
        UserFilter::Credentials {
            email,
            password_secret,
        } => {
            qb.push(" WHERE email = ")
                .push_bind(email.clone())
                .push(" AND password_secret = ")
                .push_bind(password_secret.clone());
        }
        UserFilter::Gender(gender) => {
            qb.push(" WHERE gender = ").push_bind(gender.as_str());
        }
        UserFilter::UpdatedBetween { from, to } => {
            // BETWEEN with from > to matches nothing
            qb.push(" WHERE updated_date BETWEEN ")
                .push_bind(*from)
                .push(" AND ")
                .push_bind(*to);
        }
    }
}

fn select_where(filter: &UserFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM users"));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY id");
    qb
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn next_id(&self) -> UserResult<i64> {
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval('users_id_seq')")
            .fetch_one(&self.db)
            .await?;
        Ok(id)
    }

    async fn insert(&self, user: UserRecord) -> UserResult<()> {
        let res = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_secret, username, gender, created_date, updated_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_secret)
        .bind(&user.username)
        .bind(user.gender.as_str())
        .bind(user.created_date)
        .bind(user.updated_date)
        .execute(&self.db)
        .await;

        match res {
            Ok(_) => {
                debug!(user_id = user.id, "pg insert");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(UserError::Conflict { id: user.id })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<UserRecord>> {
        self.find_one(&UserFilter::Id(id)).await
    }

    async fn find_one(&self, filter: &UserFilter) -> UserResult<Option<UserRecord>> {
        let mut qb = select_where(filter);
        qb.push(" LIMIT 1");
        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(&self.db)
            .await?;
        row.map(UserRecord::try_from).transpose()
    }

    async fn find_all(&self, filter: &UserFilter) -> UserResult<Vec<UserRecord>> {
        let mut qb = select_where(filter);
        let rows = qb.build_query_as::<UserRow>().fetch_all(&self.db).await?;
        into_records(rows)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> UserResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET email = $2, password_secret = $3, username = $4,
                   updated_date = GREATEST($5, created_date)
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.password_secret)
        .bind(changes.username)
        .bind(changes.updated_date)
        .fetch_optional(&self.db)
        .await?;
        row.map(UserRecord::try_from).transpose()
    }

    async fn remove(&self, id: i64) -> UserResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.ok_or(UserError::NotFound)?.try_into()
    }

    async fn count(&self) -> UserResult<usize> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    async fn min_created_date(&self) -> UserResult<Option<Date>> {
        let d = sqlx::query_scalar::<_, Option<Date>>("SELECT MIN(created_date) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(d)
    }

    async fn max_created_date(&self) -> UserResult<Option<Date>> {
        let d = sqlx::query_scalar::<_, Option<Date>>("SELECT MAX(created_date) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(d)
    }

    async fn range(&self, offset: usize, limit: usize) -> UserResult<Vec<UserRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(to_sql_int(limit))
        .bind(to_sql_int(offset))
        .fetch_all(&self.db)
        .await?;
        into_records(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::model::Gender;
    use time::macros::date;

    #[test]
    fn select_all_has_no_where_clause() {
        let qb = select_where(&UserFilter::All);
        assert_eq!(
            qb.sql(),
            format!("SELECT {COLUMNS} FROM users ORDER BY id")
        );
    }

    #[test]
    fn credentials_bind_two_params() {
        let qb = select_where(&UserFilter::Credentials {
            email: "a@b.io".into(),
            password_secret: "password123".into(),
        });
        assert!(qb
            .sql()
            .ends_with("WHERE email = $1 AND password_secret = $2 ORDER BY id"));
    }

    #[test]
    fn date_range_uses_between() {
        let qb = select_where(&UserFilter::UpdatedBetween {
            from: date!(2024 - 01 - 01),
            to: date!(2024 - 01 - 31),
        });
        assert!(qb.sql().contains("WHERE updated_date BETWEEN $1 AND $2"));
    }

    #[test]
    fn gender_filter_binds_text() {
        let qb = select_where(&UserFilter::Gender(Gender::Female));
        assert!(qb.sql().contains("WHERE gender = $1"));
    }

    #[test]
    fn unknown_gender_row_is_a_storage_error() {
        let row = UserRow {
            id: 1,
            email: "a@b.io".into(),
            password_secret: "x".into(),
            username: "a".into(),
            gender: "robot".into(),
            created_date: date!(2024 - 01 - 01),
            updated_date: date!(2024 - 01 - 01),
        };
        assert!(matches!(
            UserRecord::try_from(row),
            Err(UserError::Storage(_))
        ));
    }

    #[test]
    fn oversized_limits_saturate() {
        assert_eq!(to_sql_int(usize::MAX), i64::MAX);
        assert_eq!(to_sql_int(25), 25);
    }
}
