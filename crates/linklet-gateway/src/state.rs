use linklet_core::AuthStore;
use std::sync::Arc;

/// Shared handler state: the backend-agnostic store plus the externally
/// visible base address short URLs are rendered against.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuthStore>,
    pub base_url: Arc<str>,
    pub auth_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn AuthStore>, base_url: &str, auth_secret: &str) -> Self {
        Self {
            store,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            auth_secret: Arc::from(auth_secret),
        }
    }
}
