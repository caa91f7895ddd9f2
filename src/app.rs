use crate::films::handlers::{
    handle_create_film, handle_delete_film, handle_get_film, handle_list_films, handle_update_film,
};
use crate::films::protocol::{ENDPOINT_FILM, ENDPOINT_FILMS, MAX_BODY_BYTES};
use crate::limiter::{RateLimitLayerState, RateLimiter, enforce_rate_limit};
use crate::store::FilmStore;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Extension, Router, middleware};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Handles shared by every request. Built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn FilmStore>,
}

impl AppContext {
    pub fn new(store: Arc<dyn FilmStore>) -> Self {
        Self { store }
    }
}

/// Assembles the films API. The rate limiter runs before routing, so a
/// rejected request never reaches a handler.
pub fn build_router(ctx: AppContext, limiter: Arc<dyn RateLimiter>) -> Router {
    Router::new()
        .route(ENDPOINT_FILMS, get(handle_list_films).post(handle_create_film))
        .route(
            ENDPOINT_FILM,
            get(handle_get_film)
                .put(handle_update_film)
                .delete(handle_delete_film),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(ctx))
        .layer(middleware::from_fn_with_state(
            RateLimitLayerState::new(limiter),
            enforce_rate_limit,
        ))
        .layer(TraceLayer::new_for_http())
}
