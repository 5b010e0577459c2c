use crate::error::Result;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;

pub async fn ping_handler(State(state): State<AppState>) -> Result<StatusCode> {
    state.store.ping().await?;
    Ok(StatusCode::OK)
}
