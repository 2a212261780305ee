use axum::response::{IntoResponse, Response};
use hyper::StatusCode;
use parley_entities::ResultError;
use serde::{Serialize, Deserialize};
use tracing::error;


#[derive(Debug, Clone)]
pub struct APIError {
    pub message: String,
    pub code: StatusCode
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct APIErrorResponse {
    pub message: String
}

impl APIError {
    pub fn new_with_status<S: Into<String>>(code: StatusCode, message: S) -> Self {
        APIError {
            message: message.into(),
            code
        }
    }
}

impl From<ResultError> for APIError {
    fn from(err: ResultError) -> Self {
        let code = if err.is_not_found() { StatusCode::NOT_FOUND } else { StatusCode::INTERNAL_SERVER_ERROR };
        error!("Error while handling request {}", err);
        APIError { message: err.to_string(), code }
    }
}

impl From<anyhow::Error> for APIError {
    fn from(err: anyhow::Error) -> Self {
        error!("Error while handling request {}", err);
        APIError { message: err.to_string(), code: StatusCode::INTERNAL_SERVER_ERROR }
    }
}

impl IntoResponse for APIError
{
    fn into_response(self) -> Response {
        let body = APIErrorResponse { message: self.message };
        (self.code, axum::Json(body)).into_response()
    }
}
