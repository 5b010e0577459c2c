use crate::error::Result;
use crate::model::UrlResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use linklet_core::{ShortId, UserId};

/// `GET /api/user/urls` — every active URL the caller has shortened,
/// or 204 when there are none.
pub async fn user_urls_handler(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
) -> Result<Response> {
    let urls = state.store.load_users(uid).await?;
    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let mut listing: Vec<UrlResponse> = urls
        .into_iter()
        .map(|(id, url)| UrlResponse {
            short_url: id.to_url(&state.base_url),
            original_url: url.to_string(),
        })
        .collect();
    listing.sort_by(|a, b| a.short_url.cmp(&b.short_url));

    Ok(Json(listing).into_response())
}

/// `DELETE /api/user/urls` — soft-deletes the listed identifiers owned
/// by the caller. Identifiers owned by someone else are ignored.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Json(ids): Json<Vec<String>>,
) -> Result<StatusCode> {
    let ids: Vec<ShortId> = ids.into_iter().map(ShortId::new).collect();
    state.store.delete_users(uid, &ids).await?;
    Ok(StatusCode::ACCEPTED)
}
