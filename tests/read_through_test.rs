mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use uuid::Uuid;

use common::{page, seed_todos, service_with, FlakyCache, InMemoryTodoStore};
use todo_list_cache::{CacheBackend, StoreError};

#[tokio::test]
async fn test_second_read_is_served_from_cache() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 3).await;

    let first = service.list_todos(owner, page(1, 5)).await.unwrap();
    assert_eq!(store.page_fetches(), 1);
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.total_items, 3);

    let second = service.list_todos(owner, page(1, 5)).await.unwrap();
    assert_eq!(store.page_fetches(), 1, "a hit must not query the store");
    assert_eq!(second, first);

    let stats = service.statistics();
    assert_eq!(stats.hits(), 1);
    assert_eq!(stats.misses(), 1);
    assert_eq!(stats.store_fetches(), 1);
    assert_eq!(stats.populations(), 1);
}

#[tokio::test]
async fn test_pages_are_contiguous_slices() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 12).await;

    let mut titles = Vec::new();
    for p in 1..=3 {
        let result = service.list_todos(owner, page(p, 5)).await.unwrap();
        assert_eq!(result.total_items, 12);
        assert_eq!(result.total_pages(), 3);
        titles.extend(result.items.into_iter().map(|t| t.title));
    }

    let expected: Vec<String> = (0..12).map(|i| format!("todo #{i}")).collect();
    assert_eq!(titles, expected);
    // One key per page.
    assert_eq!(store.page_fetches(), 3);
    assert_eq!(cache.inner().len(), 3);

    let beyond = service.list_todos(owner, page(4, 5)).await.unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total_items, 12);
}

#[tokio::test]
async fn test_page_size_is_part_of_the_key() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 6).await;

    let five = service.list_todos(owner, page(1, 5)).await.unwrap();
    let three = service.list_todos(owner, page(1, 3)).await.unwrap();

    assert_eq!(five.items.len(), 5);
    assert_eq!(three.items.len(), 3);
    assert_eq!(store.page_fetches(), 2);
}

#[tokio::test]
async fn test_owners_do_not_share_cached_pages() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    seed_todos(store.as_ref(), alice, 4).await;
    seed_todos(store.as_ref(), bob, 2).await;

    let alice_page = service.list_todos(alice, page(1, 10)).await.unwrap();
    let bob_page = service.list_todos(bob, page(1, 10)).await.unwrap();

    assert_eq!(alice_page.total_items, 4);
    assert_eq!(bob_page.total_items, 2);
    assert!(alice_page.items.iter().all(|t| t.owner_id == alice));
    assert!(bob_page.items.iter().all(|t| t.owner_id == bob));
    assert_eq!(store.page_fetches(), 2);
}

#[tokio::test]
async fn test_cache_read_failure_falls_back_to_store() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 7).await;

    let expected = service.list_todos(owner, page(2, 5)).await.unwrap();
    assert_eq!(store.page_fetches(), 1);

    cache.set_fail_reads(true);
    let degraded = service.list_todos(owner, page(2, 5)).await.unwrap();

    assert_eq!(store.page_fetches(), 2, "a failed cache read must query the store");
    assert_eq!(degraded, expected);
    assert_eq!(degraded.items.len(), 2);
    assert!(service.statistics().cache_errors() >= 1);
}

#[tokio::test]
async fn test_slow_cache_read_counts_as_miss() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 2).await;

    service.list_todos(owner, page(1, 5)).await.unwrap();
    cache.set_read_delay(Some(Duration::from_millis(500)));

    let result = service.list_todos(owner, page(1, 5)).await.unwrap();
    assert_eq!(result.total_items, 2);
    assert_eq!(store.page_fetches(), 2);
    assert_eq!(service.statistics().hits(), 0);
}

#[tokio::test]
async fn test_unreachable_cache_still_serves_listings() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    cache.set_all_failing(true);
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 3).await;

    for _ in 0..3 {
        let result = service.list_todos(owner, page(1, 2)).await.unwrap();
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.total_items, 3);
    }
    assert_eq!(store.page_fetches(), 3);
    assert_eq!(service.statistics().populations(), 0);
}

#[tokio::test]
async fn test_malformed_cached_payload_is_treated_as_miss() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 2).await;

    let key = service.key_scheme().list_key(owner, page(1, 5));
    cache
        .inner()
        .set(&key, "{\"data\":[],\"meta\":{\"totalItems\":99}}".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    let result = service.list_todos(owner, page(1, 5)).await.unwrap();
    assert_eq!(result.total_items, 2);
    assert_eq!(store.page_fetches(), 1);

    // The bad entry was replaced by the fresh page.
    service.list_todos(owner, page(1, 5)).await.unwrap();
    assert_eq!(store.page_fetches(), 1);
}

#[tokio::test]
async fn test_store_failure_surfaces_and_skips_population() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    store.set_failing(true);

    let result = service.list_todos(owner, page(1, 5)).await;
    assert!(matches!(result, Err(StoreError::Failure(_))));
    assert!(cache.inner().is_empty());

    store.set_failing(false);
    let result = service.list_todos(owner, page(1, 5)).await.unwrap();
    assert_eq!(result.total_items, 0);
}

#[tokio::test]
async fn test_store_timeout_is_a_hard_failure() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    store.set_delay(Some(Duration::from_secs(2)));

    let result = service.list_todos(Uuid::new_v4(), page(1, 5)).await;
    assert!(matches!(result, Err(StoreError::Timeout(_))));
    assert!(cache.inner().is_empty());
}

#[tokio::test]
async fn test_population_failure_does_not_fail_the_read() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    cache.set_fail_writes(true);
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 1).await;

    assert_eq!(service.list_todos(owner, page(1, 5)).await.unwrap().total_items, 1);
    assert_eq!(service.list_todos(owner, page(1, 5)).await.unwrap().total_items, 1);
    assert_eq!(store.page_fetches(), 2);
}

#[tokio::test]
async fn test_concurrent_misses_all_succeed() {
    let store = Arc::new(InMemoryTodoStore::new());
    let cache = Arc::new(FlakyCache::new());
    let service = service_with(store.clone(), cache.clone());
    let owner = Uuid::new_v4();
    seed_todos(store.as_ref(), owner, 9).await;

    let results = join_all((0..8).map(|_| service.list_todos(owner, page(2, 4)))).await;

    let first = results[0].as_ref().unwrap().clone();
    assert_eq!(first.items.len(), 4);
    for result in &results {
        assert_eq!(result.as_ref().unwrap(), &first);
    }
    let fetches = store.page_fetches();
    assert!((1..=8).contains(&fetches));

    // Whatever population won, the next read is a hit.
    service.list_todos(owner, page(2, 4)).await.unwrap();
    assert_eq!(store.page_fetches(), fetches);
}
