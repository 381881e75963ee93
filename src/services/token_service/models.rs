use serde::{Deserialize, Serialize};

///
/// Claims carried by an access token. Besides the user ID, the
/// username and email are included for the client's convenience.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "_id")]
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub exp: i64,
    pub jti: String,
}

///
/// Claims carried by a refresh token. Only the user ID.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "_id")]
    pub user_id: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensModel {
    pub access_token: String,
    pub refresh_token: String,
}
