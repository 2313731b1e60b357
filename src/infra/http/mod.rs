pub mod api;
mod middleware;

pub use api::{ApiState, StoreHealth};
pub use middleware::RequestContext;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware as axum_middleware;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use middleware::{log_responses, set_request_context};

/// Full HTTP surface with request tagging and response logging applied.
pub fn build_router(state: ApiState, upload_limit: usize) -> Router {
    api::build_api_router(state, upload_limit)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

pub(crate) fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
