//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::{Result, ServerError, field_error};
use crate::user::User;

const USER_COLUMNS: &str =
    "id, name, email, email_verified_at, password, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database and return the stored row.
    pub async fn insert(&self, user: &User) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    ServerError::Validation(email_taken())
                },
                err => err.into(),
            })
    }

    /// Whether an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Find user using `id` field.
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let query = get_by_field_query(Field::Id);

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Find user using `email` field.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = get_by_field_query(Field::Email);

        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }
}

/// Error returned when `email` is already registered.
pub fn email_taken() -> validator::ValidationErrors {
    field_error("email", "unique", "The email has already been taken.")
}

#[derive(Debug, Clone)]
enum Field {
    Id,
    Email,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Email => write!(f, "email"),
        }
    }
}

fn get_by_field_query(field: Field) -> String {
    format!("SELECT {USER_COLUMNS} FROM users WHERE {field} = $1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_by_field() {
        assert!(get_by_field_query(Field::Email).ends_with("WHERE email = $1"));
        assert!(get_by_field_query(Field::Id).ends_with("WHERE id = $1"));
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_find_by_email(pool: Pool<Postgres>) {
        let repo = UserRepository::new(pool);

        let user = repo.find_by_email("admin@hris.test").await.unwrap().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Jane Admin");

        assert!(repo.find_by_email("nobody@hris.test").await.unwrap().is_none());
        assert!(repo.email_exists("admin@hris.test").await.unwrap());
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql"))]
    async fn test_insert_duplicate_email(pool: Pool<Postgres>) {
        let repo = UserRepository::new(pool);
        let user = User {
            name: "Other".into(),
            email: "admin@hris.test".into(),
            password: "hash".into(),
            ..Default::default()
        };

        match repo.insert(&user).await {
            Err(ServerError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("email"))
            },
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
