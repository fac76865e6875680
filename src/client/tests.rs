//! Tests for the API client module

use super::*;
use crate::auth::{CredentialRecord, CredentialResolver, TokenIssuer};
use crate::error::Error;
use crate::store::MemoryStore;
use crate::types::JsonValue;
use async_trait::async_trait;
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use test_case::test_case;

// ============================================================================
// Test harness
// ============================================================================

#[derive(Debug)]
struct RecordedRequest {
    url: String,
    params: Vec<(String, String)>,
    headers: HashMap<String, String>,
}

/// Transport stub returning canned responses in order
#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<JsonValue>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    fn new(responses: impl IntoIterator<Item = JsonValue>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        std::mem::take(&mut self.requests.lock().unwrap())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> crate::error::Result<JsonValue> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            params: params.to_vec(),
            headers: headers.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Other("mock transport exhausted".to_string()))
    }
}

/// Issuer that must never be called (the seeded token is fresh)
struct NoRefreshIssuer;

#[async_trait]
impl TokenIssuer for NoRefreshIssuer {
    async fn fetch_token(&self, _credentials: &CredentialRecord) -> crate::error::Result<String> {
        Err(Error::token_request("unexpected token refresh in test"))
    }
}

fn fresh_credentials(location_id: i64) -> CredentialRecord {
    let now = Utc.with_ymd_and_hms(2021, 1, 1, 5, 34, 22).unwrap();
    CredentialRecord {
        location_id,
        partner_id: "partner".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        access_token: Some("abc123".to_string()),
        access_token_create_time: Some(now),
        system_time: now,
    }
}

async fn test_client(transport: Arc<MockTransport>) -> EzyVetClient {
    let store = Arc::new(MemoryStore::new());
    store.insert(fresh_credentials(3)).await;
    let resolver = Arc::new(CredentialResolver::new(
        store,
        Arc::new(NoRefreshIssuer),
        10,
    ));
    let api = ApiConfig {
        base_url: "https://api.test/".to_string(),
        ..ApiConfig::default()
    };
    EzyVetClient::with_parts(api, transport, resolver)
}

fn page(total: i64, page_total: i64, page_size: i64, items: Vec<JsonValue>) -> JsonValue {
    json!({
        "meta": {
            "items_total": total,
            "items_page_total": page_total,
            "items_page_size": page_size,
        },
        "items": items,
    })
}

fn wrapped(key: &str, id: i64) -> JsonValue {
    json!({ key: {"id": id, "active": 1, "testme": "string value"} })
}

// ============================================================================
// Parameter building
// ============================================================================

#[test]
fn test_build_params_adds_limit() {
    let built = build_params(Params::new());
    assert_eq!(built, vec![("limit".to_string(), "200".to_string())]);
}

#[test]
fn test_build_params_preserves_scalars() {
    let mut params = Params::new();
    params.insert("test_value".to_string(), ParamValue::from("abc"));
    params.insert("count".to_string(), ParamValue::Int(7));
    params.insert("active".to_string(), ParamValue::Bool(true));

    let built: HashMap<_, _> = build_params(params).into_iter().collect();
    assert_eq!(built["test_value"], "abc");
    assert_eq!(built["count"], "7");
    assert_eq!(built["active"], "true");
    assert_eq!(built["limit"], "200");
}

#[test]
fn test_build_params_overwrites_caller_limit() {
    let mut params = Params::new();
    params.insert("limit".to_string(), ParamValue::Int(5));

    let built: HashMap<_, _> = build_params(params).into_iter().collect();
    assert_eq!(built["limit"], "200");
}

#[test]
fn test_build_params_json_encodes_structured_values() {
    let mut params = Params::new();
    params.insert(
        "a_list".to_string(),
        ParamValue::List(vec![json!("hi"), json!("there")]),
    );
    params.insert(
        "modified_at".to_string(),
        ParamValue::Filter(Filter::new().gt(100).lte(200)),
    );

    let built: HashMap<_, _> = build_params(params).into_iter().collect();
    assert_eq!(built["a_list"], r#"["hi","there"]"#);
    assert_eq!(built["modified_at"], r#"{"gt":100,"lte":200}"#);
}

#[test]
fn test_filter_in_serialization() {
    let filter = Filter::new().is_in([24, 56, 21]);
    assert_eq!(
        serde_json::to_string(&filter).unwrap(),
        r#"{"in":[24,56,21]}"#
    );
}

// ============================================================================
// Header merge
// ============================================================================

#[test]
fn test_set_headers_merges_bearer_token() {
    let credentials = fresh_credentials(3);

    let mut existing = HashMap::new();
    existing.insert("X".to_string(), "y".to_string());

    let headers = set_headers(&credentials, Some(existing)).unwrap();
    assert_eq!(headers["X"], "y");
    assert_eq!(headers["Authorization"], "Bearer abc123");

    let headers = set_headers(&credentials, None).unwrap();
    assert_eq!(headers["Authorization"], "Bearer abc123");
    assert_eq!(headers.len(), 1);
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_get_single_page() {
    let items = (1..=5).map(|id| wrapped("testing", id)).collect();
    let transport = MockTransport::new([page(5, 1, 5, items)]);
    let client = test_client(transport.clone()).await;

    let records = client.get(3, "v2", "testing", None, None).await.unwrap().unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["id"], 1);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://api.test/v2/testing");
    assert!(requests[0]
        .params
        .contains(&("limit".to_string(), "200".to_string())));
    assert!(!requests[0].params.iter().any(|(k, _)| k == "page"));
    assert_eq!(requests[0].headers["Authorization"], "Bearer abc123");
}

#[tokio::test]
async fn test_get_flattens_pages_in_order() {
    let page_one = (1..=5).map(|id| wrapped("testing", id)).collect();
    let page_two = (6..=10).map(|id| wrapped("testing", id)).collect();
    let transport = MockTransport::new([page(10, 2, 5, page_one), page(10, 2, 5, page_two)]);
    let client = test_client(transport.clone()).await;

    let records = client.get(3, "v2", "testing", None, None).await.unwrap().unwrap();

    assert_eq!(records.len(), 10);
    assert_eq!(records[0]["id"], 1);
    // Item 0 of page 2 lands at output index 5.
    assert_eq!(records[5]["id"], 6);
    assert_eq!(records[9]["id"], 10);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1]
        .params
        .contains(&("page".to_string(), "2".to_string())));
}

#[tokio::test]
async fn test_get_lenient_meta_encoding() {
    // Some endpoints return meta counters as strings.
    let items = vec![wrapped("testing", 1)];
    let response = json!({
        "meta": {"items_total": "1", "items_page_total": "1", "items_page_size": "1"},
        "items": items,
    });
    let transport = MockTransport::new([response]);
    let client = test_client(transport).await;

    let records = client.get(3, "v2", "testing", None, None).await.unwrap().unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_get_missing_items_total_is_no_data() {
    let transport = MockTransport::new([json!({"meta": {}, "items": []})]);
    let client = test_client(transport).await;

    let result = client.get(3, "v2", "testing", None, None).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_empty_first_page_is_no_data() {
    let transport = MockTransport::new([page(0, 0, 0, vec![])]);
    let client = test_client(transport).await;

    let result = client.get(3, "v2", "testing", None, None).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_get_missing_page_total_is_malformed() {
    let response = json!({
        "meta": {"items_total": 5},
        "items": [wrapped("testing", 1)],
    });
    let transport = MockTransport::new([response]);
    let client = test_client(transport).await;

    let err = client.get(3, "v2", "testing", None, None).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_get_unwrapped_item_is_malformed() {
    let response = page(1, 1, 1, vec![json!({"wrong_key": {"id": 1}})]);
    let transport = MockTransport::new([response]);
    let client = test_client(transport).await;

    let err = client.get(3, "v2", "testing", None, None).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_get_unknown_location_missing_credentials() {
    let transport = MockTransport::new([]);
    let client = test_client(transport).await;

    let err = client.get(99, "v2", "testing", None, None).await.unwrap_err();
    assert!(matches!(err, Error::MissingCredentials { location_id: 99 }));
}

// ============================================================================
// Batched-by-ID retrieval
// ============================================================================

#[tokio::test]
async fn test_get_by_ids_chunks_by_hundred() {
    let ids: Vec<i64> = (1..=101).collect();
    let first_chunk = (1..=100).map(|id| wrapped("animal", id)).collect();
    let second_chunk = vec![wrapped("animal", 101)];
    let transport = MockTransport::new([
        page(100, 1, 100, first_chunk),
        page(1, 1, 1, second_chunk),
    ]);
    let client = test_client(transport.clone()).await;

    let records = client
        .get_by_ids(3, "v1", "animal", &ids, None)
        .await
        .unwrap();

    assert_eq!(records.len(), 101);
    assert_eq!(records[0]["id"], 1);
    assert_eq!(records[100]["id"], 101);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);

    let id_param = |req: &RecordedRequest| {
        req.params
            .iter()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.clone())
            .unwrap()
    };
    let first: JsonValue = serde_json::from_str(&id_param(&requests[0])).unwrap();
    assert_eq!(first["in"].as_array().unwrap().len(), 100);
    let second: JsonValue = serde_json::from_str(&id_param(&requests[1])).unwrap();
    assert_eq!(second["in"], json!([101]));
}

#[tokio::test]
async fn test_get_by_ids_skips_no_data_chunks() {
    let ids: Vec<i64> = (1..=150).collect();
    let second_chunk = (101..=150).map(|id| wrapped("animal", id)).collect();
    let transport = MockTransport::new([
        json!({"meta": {}, "items": []}),
        page(50, 1, 50, second_chunk),
    ]);
    let client = test_client(transport).await;

    let records = client
        .get_by_ids(3, "v1", "animal", &ids, None)
        .await
        .unwrap();

    assert_eq!(records.len(), 50);
    assert_eq!(records[0]["id"], 101);
}

// ============================================================================
// Translation lookup
// ============================================================================

#[tokio::test]
async fn test_get_translation() {
    let items = vec![
        json!({"appointmenttype": {"id": "1", "name": "red"}}),
        json!({"appointmenttype": {"id": 2, "name": "green"}}),
    ];
    let transport = MockTransport::new([page(2, 1, 2, items)]);
    let client = test_client(transport).await;

    let translation = client
        .get_translation(3, "v1", "appointmenttype")
        .await
        .unwrap();

    assert_eq!(translation.len(), 2);
    assert_eq!(translation[&1], "red");
    assert_eq!(translation[&2], "green");
}

#[tokio::test]
async fn test_get_translation_empty_when_no_data() {
    let transport = MockTransport::new([json!({"meta": {}, "items": []})]);
    let client = test_client(transport).await;

    let translation = client
        .get_translation(3, "v1", "appointmentstatus")
        .await
        .unwrap();
    assert!(translation.is_empty());
}

// ============================================================================
// Date-ranged retrieval
// ============================================================================

#[tokio::test]
async fn test_get_date_range_merges_filter() {
    let items = vec![wrapped("appointment", 1)];
    let transport = MockTransport::new([page(1, 1, 1, items)]);
    let client = test_client(transport.clone()).await;

    let mut params = Params::new();
    params.insert("active".to_string(), ParamValue::Bool(true));
    // Stale caller filter under the same field name must be overwritten.
    params.insert(
        "modified_at".to_string(),
        ParamValue::Filter(Filter::new().gt(0)),
    );

    let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2021, 1, 2, 12, 30, 0).unwrap();
    client
        .get_date_range(
            3,
            "v2",
            "appointment",
            "modified_at",
            Some(params),
            Some(start),
            Some(end),
            None,
        )
        .await
        .unwrap();

    let requests = transport.requests();
    let query: HashMap<_, _> = requests[0].params.iter().cloned().collect();
    assert_eq!(query["active"], "true");
    let filter: JsonValue = serde_json::from_str(&query["modified_at"]).unwrap();
    assert_eq!(filter["gt"], start.timestamp());
    assert_eq!(filter["lte"], end.timestamp());
}

// ============================================================================
// Date filter builder
// ============================================================================

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> i64 {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().timestamp()
}

#[test]
fn test_date_filter_start_with_days() {
    let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    let filter = build_date_filter(Some(start), None, Some(5)).unwrap();
    assert_eq!(filter.gt, Some(json!(ts(2021, 1, 1, 0, 0, 0))));
    assert_eq!(filter.lte, Some(json!(ts(2021, 1, 6, 0, 0, 0))));
    assert_eq!(filter.lt, None);
}

#[test]
fn test_date_filter_start_only() {
    let start = Utc.with_ymd_and_hms(2021, 3, 15, 8, 0, 0).unwrap();
    let filter = build_date_filter(Some(start), None, None).unwrap();
    assert_eq!(filter.gt, Some(json!(ts(2021, 3, 15, 8, 0, 0))));
    assert_eq!(filter.lte, None);
    assert_eq!(filter.lt, None);
}

#[test]
fn test_date_filter_midnight_end_normalized_to_end_of_day() {
    let end = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    let filter = build_date_filter(None, Some(end), None).unwrap();
    assert_eq!(filter.lt, Some(json!(ts(2021, 1, 1, 23, 59, 59))));
    assert_eq!(filter.gt, None);
}

#[test]
fn test_date_filter_end_with_time_not_normalized() {
    let end = Utc.with_ymd_and_hms(2021, 1, 1, 10, 30, 0).unwrap();
    let filter = build_date_filter(None, Some(end), None).unwrap();
    assert_eq!(filter.lt, Some(json!(ts(2021, 1, 1, 10, 30, 0))));
}

#[test]
fn test_date_filter_end_with_days() {
    let end = Utc.with_ymd_and_hms(2021, 1, 10, 0, 0, 0).unwrap();
    let filter = build_date_filter(None, Some(end), Some(5)).unwrap();
    // Normalized end, with the start wound back from it.
    assert_eq!(filter.lte, Some(json!(ts(2021, 1, 10, 23, 59, 59))));
    assert_eq!(filter.gt, Some(json!(ts(2021, 1, 5, 23, 59, 59))));
}

#[test]
fn test_date_filter_both_dates() {
    let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2021, 2, 1, 13, 5, 0).unwrap();
    let filter = build_date_filter(Some(start), Some(end), None).unwrap();
    assert_eq!(filter.gt, Some(json!(ts(2021, 1, 1, 0, 0, 0))));
    assert_eq!(filter.lte, Some(json!(ts(2021, 2, 1, 13, 5, 0))));
}

#[test_case(true, true, true; "both dates and days")]
#[test_case(false, false, false; "neither date")]
#[test_case(false, false, true; "days without dates")]
fn test_date_filter_invalid_combinations(start: bool, end: bool, days: bool) {
    let start = start.then(|| Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    let end = end.then(|| Utc.with_ymd_and_hms(2021, 1, 5, 0, 0, 0).unwrap());
    let days = days.then_some(5);

    let err = build_date_filter(start, end, days).unwrap_err();
    match (start.is_some(), end.is_some()) {
        (true, true) => assert!(matches!(err, Error::DateRangeOverconstrained)),
        _ => assert!(matches!(err, Error::DateRangeMissing)),
    }
}
