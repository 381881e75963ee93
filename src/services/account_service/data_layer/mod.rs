pub mod entities;

use axum::async_trait;
use chrono::Utc;
use derive_more::Constructor;
use sqlx::SqlitePool;

use crate::data_layer_error::Result;

use self::entities::UserEntity;

const USER_COLUMNS: &str = "id, username, email, full_name, pwd_hash, refresh_token, created_at, updated_at";

#[async_trait]
pub trait AccountDataLayer : Send + Sync {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserEntity>>;
    ///
    /// Returns the first user whose username equals `username` or whose email
    /// equals `email`. A `None` argument never matches.
    ///
    async fn get_user_by_username_or_email<'a>(&self, username: Option<&'a str>, email: Option<&'a str>) -> Result<Option<UserEntity>>;
    ///
    /// Inserts a new user and returns its ID
    ///
    async fn create_user<'a>(&self, username: &'a str, email: &'a str, full_name: &'a str, pwd_hash: &'a str) -> Result<i64>;

    ///
    /// Overwrites the user's stored refresh token. `None` clears it.
    /// Returns `false` if the user doesn't exist.
    ///
    async fn set_refr_token<'a>(&self, user_id: i64, token: Option<&'a str>) -> Result<bool>;
    ///
    /// Replaces the user's stored refresh token with `new_token`, but only if
    /// it currently equals `old_token`. Returns `false` if nothing was replaced.
    ///
    async fn swap_refr_token<'a>(&self, user_id: i64, old_token: &'a str, new_token: &'a str) -> Result<bool>;

    async fn update_account<'a>(&self, user_id: i64, full_name: &'a str, email: &'a str) -> Result<Option<UserEntity>>;
    async fn update_password<'a>(&self, user_id: i64, pwd_hash: &'a str) -> Result<()>;
}

#[derive(Constructor)]
pub struct DbAccountDataLayer {
    db: SqlitePool,
}

#[async_trait]
impl AccountDataLayer for DbAccountDataLayer {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserEntity>> {
        let user = sqlx::query_as::<_, UserEntity>(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?")
        )
            .bind(user_id)
            .fetch_optional(&self.db).await?;

        Ok(user)
    }

    async fn get_user_by_username_or_email<'a>(&self, username: Option<&'a str>, email: Option<&'a str>) -> Result<Option<UserEntity>> {
        let user = sqlx::query_as::<_, UserEntity>(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? ORDER BY id LIMIT 1")
        )
            .bind(username)
            .bind(email)
            .fetch_optional(&self.db).await?;

        Ok(user)
    }

    async fn create_user<'a>(&self, username: &'a str, email: &'a str, full_name: &'a str, pwd_hash: &'a str) -> Result<i64> {
        let now = Utc::now();
        let res = sqlx::query("
            INSERT INTO users (username, email, full_name, pwd_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ")
            .bind(username)
            .bind(email)
            .bind(full_name)
            .bind(pwd_hash)
            .bind(now)
            .bind(now)
            .execute(&self.db).await?;

        Ok(res.last_insert_rowid())
    }

    async fn set_refr_token<'a>(&self, user_id: i64, token: Option<&'a str>) -> Result<bool> {
        let res = sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.db).await?;

        Ok(res.rows_affected() == 1)
    }

    async fn swap_refr_token<'a>(&self, user_id: i64, old_token: &'a str, new_token: &'a str) -> Result<bool> {
        let res = sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ? AND refresh_token = ?")
            .bind(new_token)
            .bind(user_id)
            .bind(old_token)
            .execute(&self.db).await?;

        Ok(res.rows_affected() == 1)
    }

    async fn update_account<'a>(&self, user_id: i64, full_name: &'a str, email: &'a str) -> Result<Option<UserEntity>> {
        let user = sqlx::query_as::<_, UserEntity>(
            &format!("UPDATE users SET full_name = ?, email = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}")
        )
            .bind(full_name)
            .bind(email)
            .bind(Utc::now())
            .bind(user_id)
            .fetch_optional(&self.db).await?;

        Ok(user)
    }

    async fn update_password<'a>(&self, user_id: i64, pwd_hash: &'a str) -> Result<()> {
        sqlx::query("UPDATE users SET pwd_hash = ?, updated_at = ? WHERE id = ?")
            .bind(pwd_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.db).await?;

        Ok(())
    }
}
