use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The short token a URL is addressed by after shortening.
///
/// Backends allocate identifiers; callers treat them as opaque strings.
/// Lookups accept arbitrary strings, so no validation is applied here —
/// an identifier that was never issued simply resolves to `NotFound`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(String);

impl ShortId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the full shortened URL for the given base address.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl From<i64> for ShortId {
    fn from(row_id: i64) -> Self {
        Self(row_id.to_string())
    }
}

impl From<u64> for ShortId {
    fn from(counter: u64) -> Self {
        Self(counter.to_string())
    }
}

impl Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
