// Error handling and propagation for the warp handlers.
//
// Handlers return `Result<impl Reply, ApiError>` instead of rejecting: a
// rejection tells warp to try the next filter, while our errors are final
// and should short-circuit with `?`. `into_response` then turns either side
// into a response:
//
//   .then(handler)
//   .map(into_response)
//
// Every error body is JSON of the form `{ "message": "..." }`. Internal
// failures are logged here and answered with a generic message, so paths
// and error chains never reach the client.

use std::convert::Infallible;

use dropvault::StoreError;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    BadRequest(String),
    Timeout,
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl ApiError {
    /// For routes where a missing database or table is the caller's mistake
    /// and answered with 400 rather than 404.
    pub fn not_found_as_bad_request(self) -> Self {
        match self {
            ApiError::Store(err @ StoreError::NotFound(_)) => ApiError::BadRequest(err.to_string()),
            other => other,
        }
    }

    fn status_code_body(self) -> (StatusCode, String) {
        match self {
            ApiError::Store(err) => store_status_body(err),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Request timed out".to_string(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!("Request failed internally: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

fn store_status_body(err: StoreError) -> (StatusCode, String) {
    if err.is_internal() {
        tracing::error!("Storage failure: {err}");
        let message = match err {
            StoreError::CatalogUnreadable(_) => "Catalog unreadable",
            _ => "Internal storage error",
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, message.to_string());
    }

    let status = match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    let message = match err {
        StoreError::NotFound(what) => what,
        StoreError::UserExists(_) => "User already exists".to_string(),
        StoreError::EmailNotFound => "Email not found".to_string(),
        StoreError::DecryptionFailed(_) => "Decryption failed".to_string(),
        other => other.to_string(),
    };
    (status, message)
}

pub fn message_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "message": message })), status)
        .into_response()
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_code_body();
        message_reply(status, &body)
    }
}

pub fn into_response<S: Reply, E: Reply>(reply_res: Result<S, E>) -> Response {
    match reply_res {
        Ok(resp) => resp.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Turn warp's own rejections (unknown route, bad body, bad query) into the
/// same JSON error shape.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON body".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        tracing::warn!("Unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };
    Ok(message_reply(status, &message))
}
