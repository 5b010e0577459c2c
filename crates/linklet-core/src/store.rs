use crate::error::Result;
use crate::short_id::ShortId;
use crate::user_id::UserId;
use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

/// Outcome of a save operation.
///
/// Saving a URL that already has an active record is not a failure: the
/// existing identifier is returned, tagged as a conflict so the caller
/// can distinguish "fresh insert" from "hit existing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A fresh identifier was allocated for the URL.
    Created(ShortId),
    /// An active record for the same URL already existed.
    Conflict(ShortId),
}

impl SaveOutcome {
    /// The identifier the URL resolves under, regardless of outcome.
    pub fn id(&self) -> &ShortId {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Conflict(id) => id,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, SaveOutcome::Conflict(_))
    }

    pub fn into_id(self) -> ShortId {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Conflict(id) => id,
        }
    }
}

/// The base store contract every backend satisfies.
///
/// Identifiers returned by [`save`](Store::save) resolve via
/// [`load`](Store::load) to the same URL until deleted. A load by an
/// identifier that was never issued fails with `NotFound`; a load of a
/// soft-deleted record fails with `Deleted`, never `NotFound`.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Stores a URL and returns its identifier.
    ///
    /// If an active record for the same URL exists, its identifier is
    /// returned as [`SaveOutcome::Conflict`] instead of creating a
    /// duplicate.
    async fn save(&self, url: &Url) -> Result<SaveOutcome>;

    /// Resolves an identifier back to its URL.
    async fn load(&self, id: &ShortId) -> Result<Url>;

    /// Verifies the backend is reachable.
    async fn ping(&self) -> Result<()>;

    /// Releases backend resources.
    async fn close(&self) -> Result<()>;
}

/// Store contract extended with batch insertion.
#[async_trait]
pub trait BatchStore: Store {
    /// Stores all URLs in one logical operation, deduplicating per item
    /// like [`Store::save`].
    ///
    /// Returns exactly one identifier per submitted URL, in submission
    /// order, or fails as a whole with `PartialBatch` — partial results
    /// are never surfaced.
    async fn save_batch(&self, urls: &[Url]) -> Result<Vec<ShortId>>;
}

/// Store contract extended with per-user scoping.
///
/// The owner is an opaque key supplied by the caller; the store only
/// groups records by it and restricts deletion to owned identifiers.
#[async_trait]
pub trait AuthStore: BatchStore {
    /// Stores a URL associated with `owner`.
    async fn save_user(&self, owner: UserId, url: &Url) -> Result<SaveOutcome>;

    /// Batch variant of [`save_user`](AuthStore::save_user).
    async fn save_user_batch(&self, owner: UserId, urls: &[Url]) -> Result<Vec<ShortId>>;

    /// Resolves an identifier within `owner`'s records only.
    async fn load_user(&self, owner: UserId, id: &ShortId) -> Result<Url>;

    /// Lists all active records owned by `owner`. Deleted records are
    /// never included; an owner with no records gets an empty map.
    async fn load_users(&self, owner: UserId) -> Result<HashMap<ShortId, Url>>;

    /// Soft-deletes the listed identifiers owned by `owner`.
    ///
    /// Identifiers not owned by `owner` are silently ignored: deletion
    /// is idempotent and scoped, and attempting to delete something you
    /// don't own is not an error.
    async fn delete_users(&self, owner: UserId, ids: &[ShortId]) -> Result<()>;
}
