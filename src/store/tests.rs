//! Tests for the in-memory store

use super::*;
use chrono::TimeZone;

fn record(location_id: LocationId) -> CredentialRecord {
    CredentialRecord {
        location_id,
        partner_id: "partner".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        access_token: Some("abc123".to_string()),
        access_token_create_time: Some(Utc.with_ymd_and_hms(2021, 1, 1, 5, 32, 22).unwrap()),
        system_time: Utc.with_ymd_and_hms(2021, 1, 1, 5, 34, 22).unwrap(),
    }
}

#[tokio::test]
async fn test_fetch_missing_location() {
    let store = MemoryStore::new();
    let result = store.fetch(3).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_fetch_returns_seeded_record() {
    let store = MemoryStore::new();
    store.insert(record(3)).await;

    let fetched = store.fetch(3).await.unwrap().unwrap();
    assert_eq!(fetched.location_id, 3);
    assert_eq!(fetched.access_token.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn test_update_token() {
    let store = MemoryStore::new();
    store.insert(record(3)).await;

    let created = Utc.with_ymd_and_hms(2021, 1, 1, 6, 0, 0).unwrap();
    store.update_token(3, "new_token", created).await.unwrap();

    let fetched = store.fetch(3).await.unwrap().unwrap();
    assert_eq!(fetched.access_token.as_deref(), Some("new_token"));
    assert_eq!(fetched.access_token_create_time, Some(created));
    assert_eq!(store.token_updates(), 1);
}

#[tokio::test]
async fn test_watermark_roundtrip() {
    let store = MemoryStore::new();
    assert!(store
        .latest_appointment_watermark(3)
        .await
        .unwrap()
        .is_none());

    let watermark = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
    store.set_watermark(3, watermark).await;
    assert_eq!(
        store.latest_appointment_watermark(3).await.unwrap(),
        Some(watermark)
    );
}
