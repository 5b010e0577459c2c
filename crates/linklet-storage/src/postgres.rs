use async_trait::async_trait;
use linklet_core::{AuthStore, BatchStore, Result, SaveOutcome, ShortId, Store, StoreError, UserId};
use sqlx::postgres::PgPool;
use sqlx::{QueryBuilder, Row};
use std::collections::HashMap;
use url::Url;

/// Durable Postgres store.
///
/// One table holds every record; soft delete sets `deleted_at`. A unique
/// index over `original_url`, filtered to rows where `deleted_at IS
/// NULL`, enforces at-most-one-active-record-per-URL at the engine
/// level: inserting a duplicate active URL turns into an upsert that
/// touches `updated_at` and returns the existing row's identifier, which
/// is how a save distinguishes a fresh insert from a dedup hit. All
/// concurrency control is delegated to the database; this layer adds no
/// locking of its own.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

const UPSERT_CLAUSE: &str = "\
    ON CONFLICT (original_url) WHERE deleted_at IS NULL \
    DO UPDATE SET updated_at = NOW()";

impl PostgresStore {
    /// Creates a store from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the table and indices if absent. Idempotent; safe to run
    /// on every startup.
    pub async fn bootstrap(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id bigserial PRIMARY KEY,
                original_url text NOT NULL,
                user_id uuid,
                updated_at timestamptz,
                deleted_at timestamptz
            )
            "#,
            "CREATE INDEX IF NOT EXISTS urls_user_id_idx ON urls (user_id)",
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS urls_original_url_active_idx
                ON urls (original_url) WHERE deleted_at IS NULL
            "#,
        ];

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn upsert(&self, url: &Url, owner: Option<UserId>) -> Result<SaveOutcome> {
        let query = format!(
            "INSERT INTO urls (original_url, user_id) VALUES ($1, $2) {UPSERT_CLAUSE} \
             RETURNING id, (updated_at IS NOT NULL) AS conflicted"
        );

        let row = sqlx::query(&query)
            .bind(url.as_str())
            .bind(owner.map(|o| o.as_uuid()))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        let conflicted: bool = row.try_get("conflicted").map_err(map_sqlx_error)?;

        Ok(if conflicted {
            SaveOutcome::Conflict(ShortId::from(id))
        } else {
            SaveOutcome::Created(ShortId::from(id))
        })
    }

    /// Multi-row upsert in one explicit transaction. Rolls back and
    /// reports the whole batch as failed if the returned row count does
    /// not match the count of distinct URLs submitted.
    async fn upsert_batch(&self, urls: &[Url], owner: Option<UserId>) -> Result<Vec<ShortId>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let owner = owner.map(|o| o.as_uuid());

        // A single INSERT cannot touch the same row twice, so duplicate
        // URLs within one batch are collapsed here and fanned back out
        // to their submission positions afterwards.
        let mut distinct: Vec<&Url> = Vec::with_capacity(urls.len());
        let mut position: HashMap<&Url, usize> = HashMap::with_capacity(urls.len());
        for url in urls {
            position.entry(url).or_insert_with(|| {
                distinct.push(url);
                distinct.len() - 1
            });
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("INSERT INTO urls (original_url, user_id) ");
        builder.push_values(distinct.iter().copied(), |mut row, url| {
            row.push_bind(url.as_str()).push_bind(owner);
        });
        builder.push(format!(" {UPSERT_CLAUSE} RETURNING id"));

        let rows = builder
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let mut distinct_ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
            distinct_ids.push(ShortId::from(id));
        }

        if distinct_ids.len() != distinct.len() {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Err(StoreError::PartialBatch {
                submitted: distinct.len(),
                saved: distinct_ids.len(),
            });
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(urls
            .iter()
            .map(|url| distinct_ids[position[url]].clone())
            .collect())
    }

    async fn load_row(&self, id: &ShortId, owner: Option<UserId>) -> Result<Url> {
        // Identifiers are rendered bigserial keys; anything that does
        // not parse back cannot match a row.
        let Some(row_id) = parse_row_id(id) else {
            return Err(StoreError::NotFound);
        };

        let row = match owner {
            Some(owner) => {
                sqlx::query(
                    "SELECT original_url, (deleted_at IS NOT NULL) AS deleted \
                     FROM urls WHERE id = $1 AND user_id = $2",
                )
                .bind(row_id)
                .bind(owner.as_uuid())
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT original_url, (deleted_at IS NOT NULL) AS deleted \
                     FROM urls WHERE id = $1",
                )
                .bind(row_id)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StoreError::NotFound);
        };

        let deleted: bool = row.try_get("deleted").map_err(map_sqlx_error)?;
        if deleted {
            return Err(StoreError::Deleted);
        }

        let raw: String = row.try_get("original_url").map_err(map_sqlx_error)?;
        parse_stored_url(&raw)
    }
}

fn parse_row_id(id: &ShortId) -> Option<i64> {
    id.as_str().parse().ok()
}

fn parse_stored_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| StoreError::InvalidData(format!("stored url '{raw}': {e}")))
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn save(&self, url: &Url) -> Result<SaveOutcome> {
        self.upsert(url, None).await
    }

    async fn load(&self, id: &ShortId) -> Result<Url> {
        self.load_row(id, None).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[async_trait]
impl BatchStore for PostgresStore {
    async fn save_batch(&self, urls: &[Url]) -> Result<Vec<ShortId>> {
        self.upsert_batch(urls, None).await
    }
}

#[async_trait]
impl AuthStore for PostgresStore {
    async fn save_user(&self, owner: UserId, url: &Url) -> Result<SaveOutcome> {
        self.upsert(url, Some(owner)).await
    }

    async fn save_user_batch(&self, owner: UserId, urls: &[Url]) -> Result<Vec<ShortId>> {
        self.upsert_batch(urls, Some(owner)).await
    }

    async fn load_user(&self, owner: UserId, id: &ShortId) -> Result<Url> {
        self.load_row(id, Some(owner)).await
    }

    async fn load_users(&self, owner: UserId) -> Result<HashMap<ShortId, Url>> {
        let rows = sqlx::query(
            "SELECT id, original_url FROM urls \
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut urls = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
            let raw: String = row.try_get("original_url").map_err(map_sqlx_error)?;
            urls.insert(ShortId::from(id), parse_stored_url(&raw)?);
        }
        Ok(urls)
    }

    async fn delete_users(&self, owner: UserId, ids: &[ShortId]) -> Result<()> {
        let row_ids: Vec<i64> = ids.iter().filter_map(parse_row_id).collect();
        if row_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "UPDATE urls SET deleted_at = NOW() \
             WHERE user_id = $1 AND id = ANY($2) AND deleted_at IS NULL",
        )
        .bind(owner.as_uuid())
        .bind(&row_ids)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
