use std::borrow::Cow;
use std::error::Error as StdError;

use crate::application::error::{CatalogError, ErrorKind, ErrorReport};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

const SOURCE: &str = "infra::http::api";

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const INTERNAL: &str = "internal_error";
    pub const EXPIRED: &str = "expired";
    pub const INVALID_PHOTO: &str = "invalid_photo";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: Cow<'static, str>,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            hint,
            report: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Session token required",
            None,
        )
    }

    /// A collaborator failure. The cause goes to the log, not the client.
    pub fn internal(message: &'static str, cause: &dyn StdError) -> Self {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        Self {
            status,
            code: codes::INTERNAL,
            message: Cow::Borrowed(message),
            hint: None,
            report: Some(ErrorReport::from_error(SOURCE, status, cause)),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let (status, code) = match err.kind() {
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, codes::NOT_FOUND),
            ErrorKind::Unauthorized => (StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED),
            ErrorKind::BadRequest => (StatusCode::BAD_REQUEST, codes::BAD_REQUEST),
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, codes::INTERNAL),
        };
        // Collaborator failures stay in the log; policy failures are safe to show.
        let hint = err.domain().map(ToString::to_string);
        let report = ErrorReport::from_error(SOURCE, status, &err);

        Self {
            status,
            code,
            message: Cow::Owned(err.message().to_string()),
            hint,
            report: Some(report),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message.as_ref())
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.into_owned(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        report.attach(&mut response);
        response
    }
}
