use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::document::ParseError;
use crate::extractor::{Page, PaginationInfo};
use crate::fetch::FetchError;

/// The success envelope every route answers with.
#[derive(Serialize, Debug, Clone)]
pub struct Envelope<T> {
    status: &'static str,
    message: &'static str,
    data: T,
    pagination: Option<PaginationInfo>,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            message: "",
            data,
            pagination: None,
        }
    }

    /// Wraps a page. `wrap` shapes its items into the response data.
    pub fn paginated<U>(page: Page<U>, wrap: impl FnOnce(U) -> T) -> Self {
        Self {
            pagination: page.pagination,
            ..Self::new(wrap(page.data))
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Fetching or parsing the upstream page failed.
    Upstream(String),
    BadRequest(String),
    NotFound(String),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self::Upstream(format!("upstream blocked or failed: {e}"))
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        Self::Upstream(format!("could not parse the upstream page: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Failure {
            status: &'static str,
            message: String,
        }

        let (status, message) = match self {
            Self::Upstream(message) => {
                warn!("{message}");

                (StatusCode::BAD_GATEWAY, message)
            }

            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),

            Self::NotFound(message) => {
                info!("{message}");

                (StatusCode::NOT_FOUND, message)
            }
        };

        let body = Failure {
            status: "failed",
            message,
        };

        (status, Json(body)).into_response()
    }
}
