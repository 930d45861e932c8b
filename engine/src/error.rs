//! The only error type the engine itself ever raises to the HTTP boundary.
//!
//! Every collaborator failure (network, malformed payload, empty model) is
//! absorbed locally as a neutral value long before it could reach here — see
//! `data_access` and `recommender`. This type exists purely for the
//! `InvalidInputError` case of the error taxonomy (non-integer user id,
//! malformed query parameter).

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        HttpResponse::build(code).json(ErrorBody {
            error: self.to_string(),
            code: code.as_u16(),
        })
    }
}
