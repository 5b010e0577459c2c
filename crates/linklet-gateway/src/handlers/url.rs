use crate::error::{ApiError, Result};
use crate::model::{BatchShortenRequest, BatchShortenResponse, ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use linklet_core::{SaveOutcome, ShortId, UserId};
use url::Url;

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| ApiError::InvalidUrl(format!("'{raw}': {e}")))
}

fn save_status(outcome: &SaveOutcome) -> StatusCode {
    if outcome.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    }
}

/// `POST /` — plain-text URL body, plain-text short URL response.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    body: String,
) -> Result<Response> {
    let url = parse_url(&body)?;
    let outcome = state.store.save_user(uid, &url).await?;
    let short_url = outcome.id().to_url(&state.base_url);
    Ok((save_status(&outcome), short_url).into_response())
}

/// `POST /api/shorten` — JSON body, JSON short URL response.
pub async fn shorten_api_handler(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Json(request): Json<ShortenRequest>,
) -> Result<Response> {
    let url = parse_url(&request.url)?;
    let outcome = state.store.save_user(uid, &url).await?;
    let response = ShortenResponse {
        result: outcome.id().to_url(&state.base_url),
    };
    Ok((save_status(&outcome), Json(response)).into_response())
}

/// `POST /api/shorten/batch` — correlated batch shortening.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(uid): Extension<UserId>,
    Json(items): Json<Vec<BatchShortenRequest>>,
) -> Result<Response> {
    let urls = items
        .iter()
        .map(|item| parse_url(&item.original_url))
        .collect::<Result<Vec<_>>>()?;

    let ids = state.store.save_user_batch(uid, &urls).await?;

    let response: Vec<BatchShortenResponse> = items
        .iter()
        .zip(ids)
        .map(|(item, id)| BatchShortenResponse {
            correlation_id: item.correlation_id.clone(),
            short_url: id.to_url(&state.base_url),
        })
        .collect();
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// `GET /{id}` — temporary redirect to the original URL.
pub async fn expand_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let url = state.store.load(&ShortId::new(id)).await?;
    Ok((
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, url.to_string())],
    )
        .into_response())
}
