pub mod error;
pub mod models;
pub mod settings;

use base64::{engine::general_purpose, Engine};
use chrono::Utc;
use derive_more::Constructor;
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use rand::{rngs::OsRng, Rng};
use sha2::Sha256;

use self::{settings::TokenSettings, error::{Result, TokenError}, models::{AccessClaims, AuthTokensModel, RefreshClaims}};

const JTI_LENGTH: usize = 16;

pub trait TokenService: Send + Sync {
    ///
    /// Using the given user information, generates a signed access token
    /// and a signed refresh token.
    ///
    fn generate_auth_tokens(&self, user_id: i64, username: &str, email: &str) -> Result<AuthTokensModel>;

    ///
    /// Verifies an access `token`, and returns its claims on successful verification.
    /// Returns `Error` if the token is malformed, incorrectly signed, or stale
    ///
    fn verify_access_token(&self, token: &str) -> Result<AccessClaims>;

    ///
    /// Verifies a refresh `token`, and returns its claims on successful verification.
    /// This only checks the signature and expiry - whether the token is the user's
    /// current one is up to the caller.
    ///
    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims>;

    fn settings(&self) -> &TokenSettings;
}

#[derive(Clone, Constructor)]
pub struct CoreTokenService {
    settings: TokenSettings
}

impl TokenService for CoreTokenService {
    fn generate_auth_tokens(&self, user_id: i64, username: &str, email: &str) -> Result<AuthTokensModel> {
        let now = Utc::now().timestamp();

        let access_claims = AccessClaims {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            exp: now + self.settings.access_token_lifetime_s,
            jti: generate_random_bytes(),
        };
        let refresh_claims = RefreshClaims {
            user_id,
            exp: now + self.settings.refresh_token_lifetime_s,
            jti: generate_random_bytes(),
        };

        let access_token = access_claims.sign_with_key(&signing_key(&self.settings.access_token_secret)?)?;
        let refresh_token = refresh_claims.sign_with_key(&signing_key(&self.settings.refresh_token_secret)?)?;

        Ok(AuthTokensModel {
            access_token,
            refresh_token,
        })
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let key = signing_key(&self.settings.access_token_secret)?;
        let claims: AccessClaims = token.verify_with_key(&key)?;

        // Check the expires parameter, and return error if the token is stale
        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::TokenStale);
        }
        Ok(claims)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        let key = signing_key(&self.settings.refresh_token_secret)?;
        let claims: RefreshClaims = token.verify_with_key(&key)?;

        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::TokenStale);
        }
        Ok(claims)
    }

    fn settings(&self) -> &TokenSettings {
        &self.settings
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>> {
    Hmac::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)
}

///
/// Generates a series of random, OS bytes, with a length equal to `JTI_LENGTH`,
/// encoded as base64
///
pub(crate) fn generate_random_bytes() -> String {
    let mut rng = OsRng::default();
    let mut bytes = [0u8; JTI_LENGTH];
    rng.fill(&mut bytes);

    general_purpose::STANDARD_NO_PAD.encode(bytes)
}

#[cfg(test)]
pub(crate) fn test_settings() -> TokenSettings {
    TokenSettings {
        access_token_secret: "access-secret".to_string(),
        refresh_token_secret: "refresh-secret".to_string(),
        access_token_lifetime_s: 60,
        refresh_token_lifetime_s: 120,
    }
}
