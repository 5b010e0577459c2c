use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linklet_core::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Gateway-facing errors with a fixed status-code mapping.
///
/// Backend error text never reaches the client; internal failures are
/// logged and rendered as a bare 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot parse given string as URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidUrl(_) => {
                (StatusCode::BAD_REQUEST, "Cannot parse given string as URL").into_response()
            }
            ApiError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND.into_response(),
            ApiError::Store(StoreError::Deleted) => StatusCode::GONE.into_response(),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn partial_batch_failure_renders_bare_500() {
        let response = ApiError::Store(StoreError::PartialBatch {
            submitted: 2,
            saved: 1,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn backend_unavailable_renders_500_without_backend_text() {
        let response =
            ApiError::Store(StoreError::Unavailable("connection refused".to_string()))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(!body.contains("connection refused"));
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn not_found_and_deleted_stay_distinct() {
        let not_found = ApiError::Store(StoreError::NotFound).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let deleted = ApiError::Store(StoreError::Deleted).into_response();
        assert_eq!(deleted.status(), StatusCode::GONE);
    }
}
