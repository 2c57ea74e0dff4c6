//! Mapping of rejections onto HTTP error responses
//!
//! Every error body has the shape `{"detail": "<message>"}`.

use crate::error::AppError;
use serde::Serialize;
use std::convert::Infallible;
use tracing::error;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{MethodNotAllowed, PayloadTooLarge, Reject, UnsupportedMediaType};
use warp::{Rejection, Reply};

/// An [`AppError`] carried through warp's rejection system
#[derive(Debug)]
pub struct ApiRejection(pub AppError);

impl Reject for ApiRejection {}

pub fn reject(error: AppError) -> Rejection {
    warp::reject::custom(ApiRejection(error))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::TaskNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn detail_for(error: &AppError) -> String {
    match error {
        AppError::TaskNotFound { .. } => "Task not found".to_string(),
        AppError::Validation { .. } => error.to_string(),
        other => {
            error!(error = %other, "Request failed with internal error");
            "Internal server error".to_string()
        }
    }
}

pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(ApiRejection(error)) = rejection.find::<ApiRejection>() {
        (status_for(error), detail_for(error))
    } else if let Some(error) = rejection.find::<BodyDeserializeError>() {
        (StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
    } else if rejection.find::<PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        )
    } else if rejection.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON request body".to_string(),
        )
    } else if rejection.find::<MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed".to_string(),
        )
    } else {
        error!(rejection = ?rejection, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { detail }),
        status,
    ))
}
