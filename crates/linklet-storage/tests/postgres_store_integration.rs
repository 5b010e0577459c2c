use std::time::Duration;

use linklet_core::{AuthStore, BatchStore, ShortId, Store, StoreError, UserId};
use linklet_storage::PostgresStore;
use linklet_test_infra::postgres::{PostgresConfig, PostgresServer};
use sqlx::postgres::PgPoolOptions;
use url::Url;

struct Fixture {
    _postgres: PostgresServer,
    store: PostgresStore,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        let store = PostgresStore::new(pool);
        store.bootstrap().await.expect("bootstrap schema");

        Self {
            _postgres: postgres,
            store,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn parse(url: &str) -> Url {
    Url::parse(url).unwrap()
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let fixture = Fixture::start().await;

    fixture.store.bootstrap().await.unwrap();
    fixture.store.bootstrap().await.unwrap();
}

#[tokio::test]
async fn save_and_load_round_trip() {
    let fixture = Fixture::start().await;
    let url = parse("https://example.com/");

    let outcome = fixture.store.save(&url).await.unwrap();
    assert!(!outcome.is_conflict());

    let loaded = fixture.store.load(outcome.id()).await.unwrap();
    assert_eq!(loaded, url);
}

#[tokio::test]
async fn duplicate_save_returns_existing_id_with_conflict() {
    let fixture = Fixture::start().await;
    let url = parse("https://example.com/");

    let first = fixture.store.save(&url).await.unwrap();
    let second = fixture.store.save(&url).await.unwrap();

    assert!(second.is_conflict());
    assert_eq!(second.id(), first.id());
}

#[tokio::test]
async fn load_unknown_id_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture.store.load(&ShortId::new("999")).await.unwrap_err();
    assert_eq!(err, StoreError::NotFound);

    // A non-numeric identifier can never match a row either.
    let err = fixture
        .store
        .load(&ShortId::new("no-such-id"))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound);
}

#[tokio::test]
async fn batch_save_returns_one_id_per_url() {
    let fixture = Fixture::start().await;
    let urls = vec![parse("https://a.com/"), parse("https://b.com/")];

    let ids = fixture.store.save_batch(&urls).await.unwrap();
    assert_eq!(ids.len(), urls.len());

    for (id, url) in ids.iter().zip(&urls) {
        assert_eq!(&fixture.store.load(id).await.unwrap(), url);
    }
}

#[tokio::test]
async fn batch_save_dedups_against_existing_records() {
    let fixture = Fixture::start().await;
    let url = parse("https://a.com/");

    let existing = fixture.store.save(&url).await.unwrap().into_id();
    let ids = fixture
        .store
        .save_batch(&[url, parse("https://b.com/")])
        .await
        .unwrap();

    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], existing);
}

#[tokio::test]
async fn batch_with_repeated_new_url_shares_one_identifier() {
    let fixture = Fixture::start().await;
    let url = parse("https://example.com/");

    // The repeated URL must not fail the statement; both positions get
    // the same identifier, matching the in-memory backend.
    let ids = fixture
        .store
        .save_batch(&[url.clone(), parse("https://b.com/"), url.clone()])
        .await
        .unwrap();

    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], ids[2]);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(fixture.store.load(&ids[0]).await.unwrap(), url);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let fixture = Fixture::start().await;

    let ids = fixture.store.save_batch(&[]).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn deleted_record_resolves_to_deleted() {
    let fixture = Fixture::start().await;
    let owner = UserId::random();

    let id = fixture
        .store
        .save_user(owner, &parse("https://example.com/"))
        .await
        .unwrap()
        .into_id();
    fixture
        .store
        .delete_users(owner, &[id.clone()])
        .await
        .unwrap();

    assert_eq!(
        fixture.store.load(&id).await.unwrap_err(),
        StoreError::Deleted
    );
    assert_eq!(
        fixture.store.load_user(owner, &id).await.unwrap_err(),
        StoreError::Deleted
    );
}

#[tokio::test]
async fn resave_after_delete_allocates_fresh_active_record() {
    let fixture = Fixture::start().await;
    let owner = UserId::random();
    let url = parse("https://example.com/");

    let first = fixture
        .store
        .save_user(owner, &url)
        .await
        .unwrap()
        .into_id();
    fixture
        .store
        .delete_users(owner, &[first.clone()])
        .await
        .unwrap();

    // The partial unique index excludes deleted rows, so the same URL
    // gets a brand-new identifier.
    let second = fixture.store.save(&url).await.unwrap();
    assert!(!second.is_conflict());
    assert_ne!(second.id(), &first);

    assert_eq!(
        fixture.store.load(&first).await.unwrap_err(),
        StoreError::Deleted
    );
    assert_eq!(fixture.store.load(second.id()).await.unwrap(), url);
}

#[tokio::test]
async fn delete_ignores_ids_owned_by_someone_else() {
    let fixture = Fixture::start().await;
    let owner = UserId::random();
    let other = UserId::random();
    let url = parse("https://example.com/");

    let id = fixture
        .store
        .save_user(owner, &url)
        .await
        .unwrap()
        .into_id();
    fixture
        .store
        .delete_users(other, &[id.clone()])
        .await
        .unwrap();

    assert_eq!(fixture.store.load(&id).await.unwrap(), url);
}

#[tokio::test]
async fn listing_excludes_deleted_records() {
    let fixture = Fixture::start().await;
    let owner = UserId::random();
    let urls = vec![parse("https://a.com/"), parse("https://b.com/")];

    let ids = fixture.store.save_user_batch(owner, &urls).await.unwrap();
    fixture
        .store
        .delete_users(owner, &[ids[0].clone()])
        .await
        .unwrap();

    let listed = fixture.store.load_users(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed.get(&ids[1]), Some(&urls[1]));
}

#[tokio::test]
async fn listing_for_unknown_owner_is_empty() {
    let fixture = Fixture::start().await;

    let listed = fixture.store.load_users(UserId::random()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn load_user_scopes_to_owner() {
    let fixture = Fixture::start().await;
    let owner = UserId::random();
    let other = UserId::random();

    let id = fixture
        .store
        .save_user(owner, &parse("https://example.com/"))
        .await
        .unwrap()
        .into_id();

    assert!(fixture.store.load_user(owner, &id).await.is_ok());
    assert_eq!(
        fixture.store.load_user(other, &id).await.unwrap_err(),
        StoreError::NotFound
    );
}

#[tokio::test]
async fn concurrent_saves_of_same_url_never_duplicate() {
    let fixture = Fixture::start().await;
    let url = parse("https://example.com/");

    let mut handles = vec![];
    for _ in 0..8 {
        let store = fixture.store.clone();
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            store.save(&url).await.unwrap().into_id()
        }));
    }

    let mut ids = vec![];
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 1, "all savers must agree on one identifier");
}

#[tokio::test]
async fn ping_succeeds_on_live_backend() {
    let fixture = Fixture::start().await;

    fixture.store.ping().await.unwrap();
}
