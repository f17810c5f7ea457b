// tests/stores.rs - Optimistic stores against a live server
mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::MockBackend;
use labdash::fixtures;
use labdash::stores::{ChatStore, ReagentStore};
use labdash::{ApiClient, Config, DataSource};

#[actix_rt::test]
async fn test_dispose_moves_reagent_into_disposals() {
    let backend = MockBackend::start();
    let (client, _) = backend.signed_in_client();
    let store = ReagentStore::new(client, DataSource::Live);

    store.load().await.unwrap();
    assert_eq!(store.reagents().len(), 2);
    assert!(store.disposed().is_empty());
    assert_eq!(store.storage()[0].location, "Cabinet A");

    let record = store.dispose("R1", "Expired", "Dr. Kim").await.unwrap();
    assert_eq!(record.id, "D1");

    let reagents = store.reagents();
    assert!(reagents.iter().all(|r| r.id != "R1"));
    assert_eq!(reagents.len(), 1);

    let disposed = store.disposed();
    assert_eq!(disposed.len(), 1);
    assert_eq!(disposed[0].id, "D1");
    assert!(!disposed[0].pending);
}

#[actix_rt::test]
async fn test_dispose_failure_restores_position() {
    let backend = MockBackend::start();
    backend.state.fail_dispose.store(true, Ordering::SeqCst);
    let (client, _) = backend.signed_in_client();
    let store = ReagentStore::new(client, DataSource::Live);
    store.load().await.unwrap();

    let err = store.dispose("R1", "Expired", "Dr. Kim").await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let ids: Vec<String> = store.reagents().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["R1".to_string(), "R2".to_string()]);
    assert!(store.disposed().is_empty());
}

#[actix_rt::test]
async fn test_failed_dispose_during_reload_keeps_ids_unique() {
    let backend = MockBackend::start();
    backend.state.fail_dispose.store(true, Ordering::SeqCst);
    backend.state.dispose_delay_ms.store(400, Ordering::SeqCst);
    let (client, _) = backend.signed_in_client();
    let store = ReagentStore::new(client, DataSource::Live);
    store.load().await.unwrap();

    let reload = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.load().await
    };
    let (disposed, reloaded) = futures::join!(store.dispose("R1", "Expired", "Dr. Kim"), reload);
    assert!(disposed.is_err());
    reloaded.unwrap();

    let ids: Vec<String> = store.reagents().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["R1".to_string(), "R2".to_string()]);
    assert!(store.disposed().is_empty());
}

#[actix_rt::test]
async fn test_dispose_during_reload_still_removes_reagent() {
    let backend = MockBackend::start();
    backend.state.dispose_delay_ms.store(400, Ordering::SeqCst);
    let (client, _) = backend.signed_in_client();
    let store = ReagentStore::new(client, DataSource::Live);
    store.load().await.unwrap();

    let reload = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.load().await
    };
    let (disposed, reloaded) = futures::join!(store.dispose("R1", "Expired", "Dr. Kim"), reload);
    assert_eq!(disposed.unwrap().id, "D1");
    reloaded.unwrap();

    let ids: Vec<String> = store.reagents().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["R2".to_string()]);
    let disposed = store.disposed();
    assert_eq!(disposed.len(), 1);
    assert_eq!(disposed[0].id, "D1");
}

#[actix_rt::test]
async fn test_first_message_creates_exactly_one_room() {
    let backend = MockBackend::start();
    let (client, _) = backend.signed_in_client();
    let store = ChatStore::new(client, DataSource::Live);

    store.load_rooms().await.unwrap();
    assert!(store.rooms().is_empty());
    assert_eq!(store.active_room_id(), None);

    let reply = store.send_message("  Where is the HCl?  ", Some("Dr. Kim")).await.unwrap().unwrap();
    assert_eq!(reply.content, "Echo: Where is the HCl?");
    assert_eq!(backend.state.rooms_created.load(Ordering::SeqCst), 1);

    let rooms = store.rooms();
    assert_eq!(rooms.len(), 1);
    assert_eq!(store.active_room_id().as_deref(), Some(rooms[0].id.as_str()));

    let messages = store.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| !m.is_temporary()));
    assert_eq!(messages[0].content, "Where is the HCl?");

    store.send_message("And the NaOH?", None).await.unwrap();
    assert_eq!(backend.state.rooms_created.load(Ordering::SeqCst), 1);
    assert_eq!(store.messages().len(), 4);
}

#[actix_rt::test]
async fn test_blank_message_sends_nothing() {
    let backend = MockBackend::start();
    let (client, _) = backend.signed_in_client();
    let store = ChatStore::new(client, DataSource::Live);

    assert!(store.send_message("   ", None).await.unwrap().is_none());
    assert_eq!(backend.state.rooms_created.load(Ordering::SeqCst), 0);
    assert!(backend.state.requests().is_empty());
}

#[actix_rt::test]
async fn test_unreachable_backend_serves_samples() {
    let client = Arc::new(ApiClient::new(&Config::for_base_url("http://127.0.0.1:1")).unwrap());
    let store = ReagentStore::new(client, DataSource::Live);

    assert!(store.load().await.unwrap_err().is_transport());
    assert_eq!(store.reagents(), fixtures::sample_reagents());
    assert_eq!(store.disposed(), fixtures::sample_disposals());
    assert!(store.snapshot().last_error.is_some());
}
