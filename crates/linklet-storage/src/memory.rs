use async_trait::async_trait;
use linklet_core::{AuthStore, BatchStore, Result, SaveOutcome, ShortId, Store, StoreError, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::Url;

/// State of a stored record.
///
/// Deletion keeps the identifier in the map, so "deleted" and "never
/// existed" stay distinguishable.
#[derive(Debug, Clone)]
enum Slot {
    Active(Url),
    Deleted,
}

#[derive(Debug, Default)]
struct Inner {
    /// identifier -> record state. Entries are never removed.
    records: HashMap<ShortId, Slot>,
    /// Reverse index over active records only; maintains the
    /// one-active-record-per-URL invariant and is dropped from on delete.
    active_by_url: HashMap<Url, ShortId>,
    /// owner -> identifiers ever saved by that owner. Record state lives
    /// in `records`; this only scopes ownership.
    by_owner: HashMap<UserId, HashSet<ShortId>>,
    next_id: u64,
}

impl Inner {
    fn save(&mut self, url: &Url, owner: Option<UserId>) -> SaveOutcome {
        if let Some(existing) = self.active_by_url.get(url) {
            // Dedup hit: the record keeps its original owner.
            return SaveOutcome::Conflict(existing.clone());
        }

        let id = ShortId::from(self.next_id);
        self.next_id += 1;

        self.records.insert(id.clone(), Slot::Active(url.clone()));
        self.active_by_url.insert(url.clone(), id.clone());
        if let Some(owner) = owner {
            self.by_owner.entry(owner).or_default().insert(id.clone());
        }

        SaveOutcome::Created(id)
    }

    fn save_batch(&mut self, urls: &[Url], owner: Option<UserId>) -> Result<Vec<ShortId>> {
        let ids: Vec<ShortId> = urls
            .iter()
            .map(|url| self.save(url, owner).into_id())
            .collect();

        if ids.len() != urls.len() {
            return Err(StoreError::PartialBatch {
                submitted: urls.len(),
                saved: ids.len(),
            });
        }
        Ok(ids)
    }

    fn load(&self, id: &ShortId) -> Result<Url> {
        match self.records.get(id) {
            None => Err(StoreError::NotFound),
            Some(Slot::Deleted) => Err(StoreError::Deleted),
            Some(Slot::Active(url)) => Ok(url.clone()),
        }
    }
}

/// Volatile in-process store.
///
/// Identifiers come from a monotonically increasing counter and are
/// unique only within the process lifetime. All mutation happens under
/// one exclusive lock; reads take the shared side. No lock is ever held
/// across an await point, so operations never block on I/O.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn save(&self, url: &Url) -> Result<SaveOutcome> {
        Ok(self.write().save(url, None))
    }

    async fn load(&self, id: &ShortId) -> Result<Url> {
        self.read().load(id)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl BatchStore for InMemoryStore {
    async fn save_batch(&self, urls: &[Url]) -> Result<Vec<ShortId>> {
        self.write().save_batch(urls, None)
    }
}

#[async_trait]
impl AuthStore for InMemoryStore {
    async fn save_user(&self, owner: UserId, url: &Url) -> Result<SaveOutcome> {
        Ok(self.write().save(url, Some(owner)))
    }

    async fn save_user_batch(&self, owner: UserId, urls: &[Url]) -> Result<Vec<ShortId>> {
        self.write().save_batch(urls, Some(owner))
    }

    async fn load_user(&self, owner: UserId, id: &ShortId) -> Result<Url> {
        let inner = self.read();
        let owned = inner
            .by_owner
            .get(&owner)
            .is_some_and(|ids| ids.contains(id));
        if !owned {
            return Err(StoreError::NotFound);
        }
        inner.load(id)
    }

    async fn load_users(&self, owner: UserId) -> Result<HashMap<ShortId, Url>> {
        let inner = self.read();
        let Some(ids) = inner.by_owner.get(&owner) else {
            return Ok(HashMap::new());
        };

        let mut urls = HashMap::new();
        for id in ids {
            if let Some(Slot::Active(url)) = inner.records.get(id) {
                urls.insert(id.clone(), url.clone());
            }
        }
        Ok(urls)
    }

    async fn delete_users(&self, owner: UserId, ids: &[ShortId]) -> Result<()> {
        let mut guard = self.write();
        let inner = &mut *guard;
        for id in ids {
            let owned = inner
                .by_owner
                .get(&owner)
                .is_some_and(|owned| owned.contains(id));
            if !owned {
                // Not this owner's identifier: intentional no-op.
                continue;
            }
            if let Some(slot) = inner.records.get_mut(id) {
                if let Slot::Active(url) = std::mem::replace(slot, Slot::Deleted) {
                    inner.active_by_url.remove(&url);
                }
            }
        }
        Ok(())
    }
}
