use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

/// Gender values a user can register with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown gender `{0}`")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(UnknownGender(s.to_string())),
        }
    }
}

/// User record held by a store.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,                  // assigned by the store, never reused
    pub email: String,
    #[serde(skip_serializing)]
    pub password_secret: String,  // compared byte-for-byte, never exposed in JSON
    pub username: String,
    pub gender: Gender,
    pub created_date: Date,
    pub updated_date: Date,
}

/// Fields a registration supplies; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_secret: String,
    pub username: String,
    pub gender: Gender,
    pub created_date: Date,
}

impl NewUser {
    pub(crate) fn into_record(self, id: i64) -> UserRecord {
        UserRecord {
            id,
            email: self.email,
            password_secret: self.password_secret,
            username: self.username,
            gender: self.gender,
            created_date: self.created_date,
            updated_date: self.created_date,
        }
    }
}

/// Full replacement of the mutable fields of a record. An `updated_date`
/// earlier than the record's `created_date` is raised to it.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub email: String,
    pub password_secret: String,
    pub username: String,
    pub updated_date: Date,
}

impl UserChanges {
    pub(crate) fn apply(self, record: &mut UserRecord) {
        record.email = self.email;
        record.password_secret = self.password_secret;
        record.username = self.username;
        record.updated_date = self.updated_date.max(record.created_date);
    }
}

/// Predicates a store can evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    All,
    Id(i64),
    Email(String),
    Username(String),
    Credentials { email: String, password_secret: String },
    Gender(Gender),
    /// Inclusive on both ends.
    UpdatedBetween { from: Date, to: Date },
}

impl UserFilter {
    pub fn matches(&self, user: &UserRecord) -> bool {
        match self {
            UserFilter::All => true,
            UserFilter::Id(id) => user.id == *id,
            UserFilter::Email(email) => user.email == *email,
            UserFilter::Username(username) => user.username == *username,
            UserFilter::Credentials {
                email,
                password_secret,
            } => user.email == *email && user.password_secret == *password_secret,
            UserFilter::Gender(gender) => user.gender == *gender,
            UserFilter::UpdatedBetween { from, to } => {
                *from <= user.updated_date && user.updated_date <= *to
            }
        }
    }
}

/// Keys users can be ordered by.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Id,
    Email,
    Username,
    Gender,
    CreatedDate,
    UpdatedDate,
}

impl SortKey {
    pub fn compare(self, a: &UserRecord, b: &UserRecord) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Email => a.email.cmp(&b.email),
            SortKey::Username => a.username.cmp(&b.username),
            SortKey::Gender => a.gender.cmp(&b.gender),
            SortKey::CreatedDate => a.created_date.cmp(&b.created_date),
            SortKey::UpdatedDate => a.updated_date.cmp(&b.updated_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn record() -> UserRecord {
        NewUser {
            email: "ann@example.com".into(),
            password_secret: "s3cret-pass".into(),
            username: "ann".into(),
            gender: Gender::Female,
            created_date: date!(2024 - 03 - 05),
        }
        .into_record(7)
    }

    #[test]
    fn new_record_starts_with_equal_dates() {
        let r = record();
        assert_eq!(r.id, 7);
        assert_eq!(r.created_date, r.updated_date);
    }

    #[test]
    fn credentials_filter_requires_exact_match() {
        let r = record();
        let ok = UserFilter::Credentials {
            email: "ann@example.com".into(),
            password_secret: "s3cret-pass".into(),
        };
        let wrong_case = UserFilter::Credentials {
            email: "ann@example.com".into(),
            password_secret: "S3cret-pass".into(),
        };
        assert!(ok.matches(&r));
        assert!(!wrong_case.matches(&r));
    }

    #[test]
    fn updated_between_is_inclusive() {
        let r = record();
        let d = r.updated_date;
        assert!(UserFilter::UpdatedBetween { from: d, to: d }.matches(&r));
        assert!(!UserFilter::UpdatedBetween {
            from: date!(2024 - 03 - 06),
            to: date!(2024 - 03 - 01),
        }
        .matches(&r));
    }

    #[test]
    fn serialized_record_hides_secret() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"createdDate\":\"2024-03-05\""));
        assert!(!json.contains("s3cret"));
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert!("robot".parse::<Gender>().is_err());
    }
}
