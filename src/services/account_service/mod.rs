pub mod error;
pub mod data_layer;
pub mod models;

use std::sync::Arc;

use argon2::Config;
use axum::async_trait;
use derive_more::Constructor;
use log::{info, warn};
use rand::{rngs::OsRng, Rng};
use tokio::task;

use crate::data_layer_error::is_unique_violation;

use self::{
    error::{Result, AccountServiceError},
    data_layer::AccountDataLayer,
    models::{UserModel, LoginModel, AuthStatusModel, RegisterUserDto, LoginDto, UpdateAccountDto, ChangePasswordDto},
};

use super::token_service::{TokenService, models::AuthTokensModel};

const SALT_LENGTH: usize = 16;

///
/// Service which manages user accounts: registration, logging in and out,
/// issuing and rotating session tokens, and updating account details.
///
#[async_trait]
pub trait AccountService: Send + Sync {
    ///
    /// Registers a new user. All fields are required. The username and
    /// email are lowercased before being checked for uniqueness and stored.
    ///
    async fn create_new_user(&self, dto: RegisterUserDto) -> Result<UserModel>;
    ///
    /// Verifies the given credentials (email or username, and password), and
    /// on success issues a new token pair, replacing the user's stored refresh token
    ///
    async fn try_accept_creds(&self, dto: LoginDto) -> Result<LoginModel>;
    ///
    /// Generates a new access and refresh token for the user, and persists the
    /// refresh token as the user's only valid one. Fails if the user no longer exists
    ///
    async fn issue_tokens(&self, user: &UserModel) -> Result<AuthTokensModel>;
    ///
    /// Exchanges a refresh token for a new token pair. The presented token must be
    /// valid AND equal to the user's stored refresh token, which is rotated out
    ///
    async fn try_accept_refresh(&self, refr_token: Option<String>) -> Result<AuthTokensModel>;
    ///
    /// Clears the user's stored refresh token
    ///
    async fn logout(&self, user_id: i64) -> Result<()>;
    async fn get_current_user(&self, user_id: Option<i64>) -> Result<UserModel>;
    fn check_auth_status(&self, user_id: Option<i64>) -> AuthStatusModel;
    async fn update_account_details(&self, user_id: i64, dto: UpdateAccountDto) -> Result<UserModel>;
    async fn change_current_password(&self, user_id: i64, dto: ChangePasswordDto) -> Result<()>;
    ///
    /// Looks up a user by ID, returning `None` if they don't exist
    ///
    async fn find_user(&self, user_id: i64) -> Result<Option<UserModel>>;
}

#[derive(Clone, Constructor)]
pub struct CoreAccountService {
    data_layer: Arc<dyn AccountDataLayer>,
    token_service: Arc<dyn TokenService>,
}

#[async_trait]
impl AccountService for CoreAccountService {
    async fn create_new_user(&self, dto: RegisterUserDto) -> Result<UserModel> {
        let (full_name, email, username, pwd) = match (
            non_empty(dto.full_name.as_deref()),
            non_empty(dto.email.as_deref()),
            non_empty(dto.username.as_deref()),
            dto.password.as_deref().filter(|p| !p.trim().is_empty()),
        ) {
            (Some(f), Some(e), Some(u), Some(p)) => (f, e.to_lowercase(), u.to_lowercase(), p),
            _ => return Err(AccountServiceError::MissingFields("All fields are required")),
        };

        // Ensure neither the username nor the email are taken
        let existing = self.data_layer.get_user_by_username_or_email(Some(&username), Some(&email)).await?;
        if existing.is_some() {
            return Err(AccountServiceError::UserAlreadyExists);
        }

        let pwd_hash = hash_password(pwd.to_string()).await?;
        let user_id = self.data_layer.create_user(&username, &email, full_name, &pwd_hash).await
            .map_err(|e| if is_unique_violation(&e) { AccountServiceError::UserAlreadyExists } else { e.into() })?;

        // Re-fetch the user to confirm it was stored
        let user = self.data_layer.get_user_by_id(user_id).await?
            .ok_or(AccountServiceError::RegistrationFailed)?;

        info!("Registered user `{}` ({})", user.username, user.id);
        Ok(user.into())
    }

    async fn try_accept_creds(&self, dto: LoginDto) -> Result<LoginModel> {
        let username = non_empty(dto.username.as_deref()).map(|u| u.to_lowercase());
        let email = non_empty(dto.email.as_deref()).map(|e| e.to_lowercase());

        if username.is_none() && email.is_none() {
            return Err(AccountServiceError::MissingFields("Email or username required"));
        }
        let pwd = dto.password.as_deref().filter(|p| !p.is_empty())
            .ok_or(AccountServiceError::MissingFields("Password required"))?;

        // Get the user associated with the username or email (if exists)
        let user = self.data_layer.get_user_by_username_or_email(username.as_deref(), email.as_deref()).await?
            .ok_or(AccountServiceError::UserNotFound)?;

        // Verify that the password given matches the user's
        if !verify_password(user.pwd_hash.clone(), pwd.to_string()).await? {
            return Err(AccountServiceError::InvalidCredentials);
        }

        let user: UserModel = user.into();
        let tokens = self.issue_tokens(&user).await?;

        Ok(LoginModel { user, tokens })
    }

    async fn issue_tokens(&self, user: &UserModel) -> Result<AuthTokensModel> {
        let tokens = self.token_service.generate_auth_tokens(user.id, &user.username, &user.email)
            .map_err(|_| AccountServiceError::TokenGenerationFailed)?;

        let stored = self.data_layer.set_refr_token(user.id, Some(&tokens.refresh_token)).await
            .map_err(|_| AccountServiceError::TokenGenerationFailed)?;
        if !stored {
            return Err(AccountServiceError::TokenGenerationFailed);
        }

        Ok(tokens)
    }

    async fn try_accept_refresh(&self, refr_token: Option<String>) -> Result<AuthTokensModel> {
        let refr_token = refr_token.filter(|t| !t.is_empty())
            .ok_or(AccountServiceError::RefreshTokenMissing)?;

        let claims = self.token_service.verify_refresh_token(&refr_token)?;

        // Get the user associated with the refresh token
        let user = self.data_layer.get_user_by_id(claims.user_id).await?
            .ok_or(AccountServiceError::InvalidRefreshToken)?;

        // Ensure the refresh token is the user's current one. If it isn't, it has
        // either been rotated out already or the user has logged out
        if user.refresh_token.as_deref() != Some(refr_token.as_str()) {
            warn!("Stale refresh token presented for user {}", user.id);
            return Err(AccountServiceError::RefreshTokenReused);
        }

        let tokens = self.token_service.generate_auth_tokens(user.id, &user.username, &user.email)
            .map_err(|_| AccountServiceError::TokenGenerationFailed)?;

        // Replace the old token, unless another request got there first
        let swapped = self.data_layer.swap_refr_token(user.id, &refr_token, &tokens.refresh_token).await?;
        if !swapped {
            warn!("Refresh token for user {} rotated concurrently", user.id);
            return Err(AccountServiceError::RefreshTokenReused);
        }

        Ok(tokens)
    }

    async fn logout(&self, user_id: i64) -> Result<()> {
        self.data_layer.set_refr_token(user_id, None).await?;
        Ok(())
    }

    async fn get_current_user(&self, user_id: Option<i64>) -> Result<UserModel> {
        let user_id = user_id.ok_or(AccountServiceError::NotLoggedIn)?;
        self.find_user(user_id).await?
            .ok_or(AccountServiceError::UserNotFound)
    }

    fn check_auth_status(&self, user_id: Option<i64>) -> AuthStatusModel {
        AuthStatusModel { is_authenticated: user_id.is_some() }
    }

    async fn update_account_details(&self, user_id: i64, dto: UpdateAccountDto) -> Result<UserModel> {
        let (full_name, email) = match (non_empty(dto.full_name.as_deref()), non_empty(dto.email.as_deref())) {
            (Some(f), Some(e)) => (f, e.to_lowercase()),
            _ => return Err(AccountServiceError::MissingFields("All fields are required")),
        };

        // The email must not belong to anyone else
        let owner = self.data_layer.get_user_by_username_or_email(None, Some(&email)).await?;
        if owner.map_or(false, |u| u.id != user_id) {
            return Err(AccountServiceError::EmailTaken(email));
        }

        let user = self.data_layer.update_account(user_id, full_name, &email).await
            .map_err(|e| if is_unique_violation(&e) { AccountServiceError::EmailTaken(email.clone()) } else { e.into() })?
            .ok_or(AccountServiceError::UserNotFound)?;

        Ok(user.into())
    }

    async fn change_current_password(&self, user_id: i64, dto: ChangePasswordDto) -> Result<()> {
        let (old_pwd, new_pwd) = match (
            dto.old_password.as_deref().filter(|p| !p.is_empty()),
            dto.new_password.as_deref().filter(|p| !p.trim().is_empty()),
        ) {
            (Some(o), Some(n)) => (o, n),
            _ => return Err(AccountServiceError::MissingFields("All fields are required")),
        };

        let user = self.data_layer.get_user_by_id(user_id).await?
            .ok_or(AccountServiceError::UserNotFound)?;

        if !verify_password(user.pwd_hash, old_pwd.to_string()).await? {
            return Err(AccountServiceError::InvalidPassword);
        }

        let pwd_hash = hash_password(new_pwd.to_string()).await?;
        self.data_layer.update_password(user_id, &pwd_hash).await?;

        Ok(())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<UserModel>> {
        let user = self.data_layer.get_user_by_id(user_id).await?;
        Ok(user.map(|u| u.into()))
    }
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|f| !f.is_empty())
}

///
/// Hashes the password on the blocking pool, with a fresh random salt
///
async fn hash_password(pwd: String) -> Result<String> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng::default().fill(&mut salt);

    task::spawn_blocking(move || argon2::hash_encoded(pwd.as_bytes(), &salt, &Config::default()))
        .await?
        .map_err(AccountServiceError::PasswordHashError)
}

async fn verify_password(pwd_hash: String, pwd: String) -> Result<bool> {
    task::spawn_blocking(move || argon2::verify_encoded(&pwd_hash, pwd.as_bytes()))
        .await?
        .map_err(AccountServiceError::PasswordHashError)
}
