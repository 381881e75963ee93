use axum::{
    async_trait,
    body::HttpBody,
    extract::{FromRequest, FromRequestParts, Path, rejection::{FormRejection, JsonRejection, PathRejection}},
    http::{header::CONTENT_TYPE, request::Parts, Request, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Form, Json,
};
use log::warn;
use serde::de::DeserializeOwned;

use crate::api_response::ApiResponse;

///
/// A request that axum couldn't extract (bad body, bad path parameter,
/// body too large). Answered with the usual failure envelope.
///
#[derive(Debug)]
pub struct ApiRejection {
    status: StatusCode,
    message: String,
}

impl ApiRejection {
    pub fn status_code(&self) -> StatusCode {
        self.status
    }
}

impl From<JsonRejection> for ApiRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self { status: rejection.status(), message: rejection.body_text() }
    }
}

impl From<FormRejection> for ApiRejection {
    fn from(rejection: FormRejection) -> Self {
        Self { status: rejection.status(), message: rejection.body_text() }
    }
}

impl From<PathRejection> for ApiRejection {
    fn from(rejection: PathRejection) -> Self {
        Self { status: rejection.status(), message: rejection.body_text() }
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        warn!("Rejected request: {}", self.message);
        ApiResponse::failure(self.status, self.message).into_response()
    }
}

///
/// Request body, either JSON or `application/x-www-form-urlencoded`
/// depending on the request's content type
///
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for Payload<T>
where
    T: DeserializeOwned,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
    S: Send + Sync,
{
    type Rejection = ApiRejection;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req.headers().get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            Ok(Self(value))
        }
    }
}

///
/// `Path` whose rejection uses the failure envelope
///
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
