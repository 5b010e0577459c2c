use serde::{Deserialize, Serialize};

/// Body of `POST /api/shorten`.
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

/// Response of `POST /api/shorten`.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub result: String,
}

/// One element of the `GET /api/user/urls` listing.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub short_url: String,
    pub original_url: String,
}

/// One element of the `POST /api/shorten/batch` request body.
#[derive(Debug, Deserialize)]
pub struct BatchShortenRequest {
    pub correlation_id: String,
    pub original_url: String,
}

/// One element of the `POST /api/shorten/batch` response body.
#[derive(Debug, Serialize)]
pub struct BatchShortenResponse {
    pub correlation_id: String,
    pub short_url: String,
}
