pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::{ApiState, StoreHealth};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
};

/// Product routes. Reads are public; writes and the owner view require a
/// resolved session actor.
pub fn build_api_router(state: ApiState, upload_limit: usize) -> Router {
    let auth = axum_middleware::from_fn_with_state(state.clone(), middleware::require_actor);

    Router::new()
        .route(
            "/api/v1/products",
            get(handlers::list_products)
                .merge(post(handlers::create_product).route_layer(auth.clone())),
        )
        .route(
            "/api/v1/products/{id}",
            get(handlers::get_product)
                .merge(patch(handlers::update_product).route_layer(auth.clone())),
        )
        .route(
            "/api/v1/products/{id}/own",
            get(handlers::get_own_product).route_layer(auth.clone()),
        )
        .route(
            "/api/v1/products/{id}/photo",
            put(handlers::upload_product_photo)
                .route_layer(auth)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/uploads/{name}", get(handlers::serve_photo))
        .route("/health", get(handlers::health))
        .with_state(state)
}
