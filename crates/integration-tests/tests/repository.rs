//! Repository and document store behavior against the fake Gist API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use party_rsvp_core::{AggregateStats, NewRecord, Record};
use party_rsvp_integration_tests::{
    FakeGistApi, config_credential, start_unresponsive_server, state_for,
};
use party_rsvp_server::store::{Document, StoreError, StoreReference};

const ONE_RECORD: &str = r#"{"rsvps":[{"id":"1700000000000","contact_name":"Ana",
    "attending":true,"adult_count":2,"kid_count":0,
    "created_at":"2025-03-01T10:00:00Z","updated_at":"2025-03-01T10:00:00Z"}]}"#;

fn candidate(name: &str, attending: bool, adults: u32, kids: u32) -> NewRecord {
    NewRecord {
        contact_name: Some(name.to_string()),
        contact_email: None,
        child_name: None,
        attending,
        adult_count: adults,
        kid_count: kids,
        note: None,
    }
}

#[tokio::test]
async fn test_list_without_store_is_empty_and_remote_free() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);

    let records = state.repository().list(&config_credential()).await.unwrap();

    assert!(records.is_empty());
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_serial_appends_keep_order_and_unique_ids() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);
    let credential = config_credential();

    let mut appended = Vec::new();
    for i in 0..6 {
        let record = state
            .repository()
            .append(&credential, candidate(&format!("guest {i}"), true, 1, 0))
            .await
            .unwrap();
        appended.push(record);
    }

    let listed = state.repository().list(&credential).await.unwrap();
    assert_eq!(listed, appended);

    let ids: HashSet<_> = listed.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids.len(), 6);
    assert_eq!(api.gist_count(), 1);
}

#[tokio::test]
async fn test_stats_over_two_records() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);
    let credential = config_credential();

    state
        .repository()
        .append(&credential, candidate("Ana", true, 2, 1))
        .await
        .unwrap();
    state
        .repository()
        .append(&credential, candidate("Ben", false, 0, 0))
        .await
        .unwrap();

    let stats = state.repository().stats(&credential).await.unwrap();
    assert_eq!(
        stats,
        AggregateStats {
            total: 2,
            going: 1,
            not_going: 1,
            total_adults: 2,
            total_kids: 1,
        }
    );

    let overview = state.repository().overview(&credential).await.unwrap();
    assert_eq!(overview.rsvps.len(), 2);
    assert_eq!(overview.stats, stats);
}

#[tokio::test]
async fn test_clear_keeps_created_at() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);
    let credential = config_credential();

    state
        .repository()
        .append(&credential, candidate("Ana", true, 2, 0))
        .await
        .unwrap();
    let reference = state
        .repository()
        .store()
        .reference_slot()
        .get()
        .await
        .unwrap();
    let before = api.document(reference.as_str()).unwrap();

    let cleared = state.repository().clear_all(&credential).await.unwrap();

    assert!(state.repository().list(&credential).await.unwrap().is_empty());
    let after = api.document(reference.as_str()).unwrap();
    assert_eq!(after["created_at"], before["created_at"]);
    assert!(after["cleared_at"].is_string());
    assert!(cleared.cleared_at.is_some());
}

#[tokio::test]
async fn test_clear_without_store_creates_nothing() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);

    state
        .repository()
        .clear_all(&config_credential())
        .await
        .unwrap();

    assert_eq!(api.gist_count(), 0);
}

#[tokio::test]
async fn test_deleted_gist_is_recreated_with_only_the_new_record() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);
    let credential = config_credential();
    let slot = state.repository().store().reference_slot();

    state
        .repository()
        .append(&credential, candidate("Ana", true, 1, 0))
        .await
        .unwrap();
    let old = slot.get().await.unwrap();

    api.delete(old.as_str());

    let record = state
        .repository()
        .append(&credential, candidate("Ben", true, 1, 0))
        .await
        .unwrap();

    let new = slot.get().await.unwrap();
    assert_ne!(new, old);
    let listed = state.repository().list(&credential).await.unwrap();
    assert_eq!(listed, vec![record]);
}

#[tokio::test]
async fn test_reads_existing_gist_in_legacy_layout() {
    let api = FakeGistApi::start().await;
    api.insert(
        "legacy",
        r#"{"rsvps":[{"id":"1700000000000","name":"Ana","email":"ana@party.test",
            "child_name":"Skye","going":true,"num_adults":2,"num_kids":1,
            "message":"See you","submitted_at":"2025-03-01T10:00:00Z",
            "updated_at":"2025-03-01T10:00:00Z"}],
            "updated_at":"2025-03-01T10:00:00Z"}"#,
    );
    let state = state_for(&api, &[("GIST_ID", "legacy")]);

    let records = state.repository().list(&config_credential()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].contact_name.as_deref(), Some("Ana"));
    assert_eq!(records[0].adult_count, 2);
    assert!(records[0].attending);
}

#[tokio::test]
async fn test_garbage_document_is_malformed_payload() {
    let api = FakeGistApi::start().await;
    api.insert("broken", "{\"rsvps\": [");
    let state = state_for(&api, &[("GIST_ID", "broken")]);

    let err = state
        .repository()
        .list(&config_credential())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        party_rsvp_server::store::StoreError::MalformedPayload(_)
    ));
}

/// Two writers that read the same version: the later write wins in full and
/// the earlier writer's entry is gone. Accepted behavior, not a bug.
#[tokio::test]
async fn test_interleaved_appends_last_writer_wins() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);
    let credential = config_credential();
    let store = state.repository().store();

    let seed = state
        .repository()
        .append(&credential, candidate("Seed", true, 1, 0))
        .await
        .unwrap();

    let mut view_a: Document<Record> = store.read(&credential).await.unwrap();
    let mut view_b: Document<Record> = store.read(&credential).await.unwrap();

    let mut a = seed.clone();
    a.id = "a".to_string().into();
    let mut b = seed.clone();
    b.id = "b".to_string().into();

    view_a.entries.push(a);
    view_b.entries.push(b.clone());

    store.write(&credential, &view_a).await.unwrap();
    store.write(&credential, &view_b).await.unwrap();

    let final_entries = state.repository().list(&credential).await.unwrap();
    assert_eq!(final_entries, vec![seed, b]);
}

#[tokio::test]
async fn test_seeded_reference_is_used() {
    let api = FakeGistApi::start().await;
    api.insert("existing", r#"{"rsvps":[]}"#);
    let state = state_for(&api, &[("GIST_ID", "existing")]);

    state
        .repository()
        .append(&config_credential(), candidate("Ana", true, 1, 0))
        .await
        .unwrap();

    assert_eq!(api.gist_count(), 1);
    assert_eq!(
        state.repository().store().reference_slot().get().await,
        Some(StoreReference::new("existing"))
    );
    assert_eq!(
        api.document("existing").unwrap()["rsvps"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_create_sets_reference_and_writes_document() {
    let api = FakeGistApi::start().await;
    let state = state_for(&api, &[]);
    let store = state.repository().store();

    let mut initial: Document<Record> = Document::new(Utc::now());
    initial.entries.push(
        state
            .repository()
            .append(&config_credential(), candidate("Ana", true, 1, 0))
            .await
            .unwrap(),
    );
    let first = store.reference_slot().get().await.unwrap();

    let reference = store.create(&config_credential(), &initial).await.unwrap();

    assert_ne!(reference, first);
    assert_eq!(store.reference_slot().get().await, Some(reference.clone()));
    assert_eq!(api.gist_count(), 2);
    let document = api.document(reference.as_str()).unwrap();
    assert_eq!(document["rsvps"][0]["contact_name"], "Ana");
    assert!(document["created_at"].is_string());
}

#[tokio::test]
async fn test_truncated_document_is_read_from_raw_url() {
    let api = FakeGistApi::start().await;
    api.insert("big", ONE_RECORD);
    api.truncate("big", true);
    let state = state_for(&api, &[("GIST_ID", "big")]);

    let records = state.repository().list(&config_credential()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].contact_name.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn test_missing_raw_file_keeps_reference() {
    let api = FakeGistApi::start().await;
    api.insert("live", ONE_RECORD);
    api.truncate("live", false);
    let state = state_for(&api, &[("GIST_ID", "live")]);

    let err = state
        .repository()
        .list(&config_credential())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::RemoteUnavailable(_)));
    assert_eq!(
        state.repository().store().reference_slot().get().await,
        Some(StoreReference::new("live"))
    );

    let err = state
        .repository()
        .append(&config_credential(), candidate("Ben", true, 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::RemoteUnavailable(_)));
    assert_eq!(api.gist_count(), 1);
    assert_eq!(api.document("live").unwrap()["rsvps"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_hung_remote_times_out_as_unavailable() {
    let api = FakeGistApi::start().await;
    let hung = start_unresponsive_server().await;
    let state = state_for(
        &api,
        &[("GIST_API_BASE", hung.as_str()), ("GIST_TIMEOUT_SECS", "1")],
    );

    let started = tokio::time::Instant::now();
    let err = state
        .repository()
        .append(&config_credential(), candidate("Ana", true, 1, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::RemoteUnavailable(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(state.repository().store().reference_slot().get().await.is_none());
}
