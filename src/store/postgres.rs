use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{EmailAddress, Subscription, User};
use crate::store::{StoreError, UserStore};

/// User store backed by the `users` table, one row per user document
#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub const fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

/// Row of the `users` table
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    subscriptions: Json<Vec<Subscription>>,
    version: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::parse(row.email).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self::restore(
            row.user_id,
            email,
            row.subscriptions.0,
            row.version,
            row.created_at,
        ))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(name = "Find user by email", skip(self))]
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, subscriptions, version, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to perform a query to fetch a user by email")?;

        let user = row
            .map(User::try_from)
            .transpose()
            .context("The stored user record is invalid")?;
        Ok(user)
    }

    #[tracing::instrument(
        name = "Saving new user in the database",
        skip(self, user),
        fields(user_email = %user.email)
    )]
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO users (user_id, email, subscriptions, version, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id)
        .bind(user.email.as_ref())
        .bind(Json(user.subscriptions()))
        .bind(user.version)
        .bind(user.created_at)
        .execute(&self.db_pool)
        .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Conflict),
            Err(e) => Err(anyhow::Error::new(e)
                .context("Failed to insert a new user")
                .into()),
        }
    }

    #[tracing::instrument(
        name = "Updating user subscriptions in the database",
        skip(self, user),
        fields(user_email = %user.email, version = user.version)
    )]
    async fn update_subscriptions(&self, user: &User) -> Result<(), StoreError> {
        let outcome = sqlx::query(
            r#"
            UPDATE users
            SET subscriptions = $1, version = version + 1
            WHERE email = $2 AND version = $3
            "#,
        )
        .bind(Json(user.subscriptions()))
        .bind(user.email.as_ref())
        .bind(user.version)
        .execute(&self.db_pool)
        .await
        .context("Failed to update user subscriptions")?;

        if outcome.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}
