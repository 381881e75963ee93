use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

///
/// The envelope every endpoint responds with, successful or not.
///
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }
}

impl ApiResponse<Option<()>> {
    ///
    /// Builds the failure envelope used by all service errors. `data` is
    /// always `null` on failure.
    ///
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, None, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

///
/// Returns an `ApiResponse` with an HTTP status that differs from the
/// envelope's `statusCode` (ie. 201 Created around a 200 envelope).
///
pub fn with_status<T: Serialize>(status: StatusCode, body: ApiResponse<T>) -> Response {
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let res = ApiResponse::ok(json!({ "a": 1 }), "done");
        let value = serde_json::to_value(&res).unwrap();

        assert_eq!(value, json!({
            "statusCode": 200,
            "data": { "a": 1 },
            "message": "done",
            "success": true
        }));
    }

    #[test]
    fn test_failure_is_not_success() {
        let res = ApiResponse::failure(StatusCode::FORBIDDEN, "nope");
        let value = serde_json::to_value(&res).unwrap();

        assert_eq!(value["statusCode"], 403);
        assert_eq!(value["success"], false);
        assert!(value["data"].is_null());
    }
}
