use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::actor::ActorError;

use super::error::{ApiError, codes};
use super::state::ApiState;

/// Resolve the bearer session token into an `Actor` request extension.
pub async fn require_actor(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers().get(header::AUTHORIZATION)) {
        Some(value) => value,
        None => return ApiError::unauthorized().into_response(),
    };

    let actor = match state.actors.resolve(&token).await {
        Ok(actor) => actor,
        Err(err) => return rejection(&err).into_response(),
    };

    request.extensions_mut().insert(actor);

    let mut response = next.run(request).await;
    // Lets the response logger name the caller.
    response.extensions_mut().insert(actor);
    response
}

fn rejection(err: &ActorError) -> ApiError {
    match err {
        ActorError::Missing | ActorError::Invalid => ApiError::unauthorized(),
        ActorError::Expired => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::EXPIRED,
            "Session expired",
            None,
        ),
        ActorError::Unavailable(_) => ApiError::internal("failed to resolve session", err),
    }
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?.trim();
    (!bearer.is_empty()).then(|| bearer.to_string())
}
