use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth::identity_middleware;
use crate::handlers::{
    delete_user_urls_handler, expand_handler, ping_handler, shorten_api_handler,
    shorten_batch_handler, shorten_text_handler, user_urls_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", post(shorten_text_handler))
            .route("/api/shorten", post(shorten_api_handler))
            .route("/api/shorten/batch", post(shorten_batch_handler))
            .route(
                "/api/user/urls",
                get(user_urls_handler).delete(delete_user_urls_handler),
            )
            .route("/ping", get(ping_handler))
            .route("/{id}", get(expand_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                identity_middleware,
            ))
            .layer(RequestDecompressionLayer::new())
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
