//! Credential record type
//!
//! Maps one row of the `ezy_vet_credentials` table, together with the
//! server clock captured at read time (`now() AS system_time`). Token
//! staleness is judged against that server clock, not the local one, so a
//! skewed worker cannot keep serving an expired token.

use chrono::{DateTime, Duration, Utc};

/// API credentials for one practice location
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    /// Location the credentials belong to
    pub location_id: i64,
    /// Partner identifier issued by the API vendor
    pub partner_id: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Cached bearer token, if one has been issued
    pub access_token: Option<String>,
    /// When the cached token was stored
    pub access_token_create_time: Option<DateTime<Utc>>,
    /// Server-reported current time at the moment the record was read
    pub system_time: DateTime<Utc>,
}

impl CredentialRecord {
    /// Whether the cached token is older than the cache TTL (or absent)
    pub fn token_is_stale(&self, cache_ttl_minutes: i64) -> bool {
        let expire_threshold = self.system_time - Duration::minutes(cache_ttl_minutes);
        match (&self.access_token, self.access_token_create_time) {
            (Some(_), Some(created)) => expire_threshold > created,
            _ => true,
        }
    }

    /// The `Authorization` header value for the cached token
    pub fn bearer_header(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|token| format!("Bearer {token}"))
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;
    use chrono::TimeZone;

    fn record(
        token: Option<&str>,
        created: Option<DateTime<Utc>>,
        system_time: DateTime<Utc>,
    ) -> CredentialRecord {
        CredentialRecord {
            location_id: 3,
            partner_id: "partner".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            access_token: token.map(String::from),
            access_token_create_time: created,
            system_time,
        }
    }

    #[test]
    fn test_fresh_token_not_stale() {
        let system_time = Utc.with_ymd_and_hms(2021, 1, 1, 5, 34, 22).unwrap();
        let created = Utc.with_ymd_and_hms(2021, 1, 1, 5, 32, 22).unwrap();
        let record = record(Some("abc123"), Some(created), system_time);
        assert!(!record.token_is_stale(10));
    }

    #[test]
    fn test_old_token_is_stale() {
        let system_time = Utc.with_ymd_and_hms(2021, 1, 1, 5, 44, 22).unwrap();
        let created = Utc.with_ymd_and_hms(2021, 1, 1, 5, 32, 22).unwrap();
        let record = record(Some("abc123"), Some(created), system_time);
        assert!(record.token_is_stale(10));
    }

    #[test]
    fn test_missing_token_is_stale() {
        let system_time = Utc.with_ymd_and_hms(2021, 1, 1, 5, 34, 22).unwrap();
        let record = record(None, None, system_time);
        assert!(record.token_is_stale(10));
    }

    #[test]
    fn test_bearer_header() {
        let system_time = Utc.with_ymd_and_hms(2021, 1, 1, 5, 34, 22).unwrap();
        let record = record(Some("abc123"), Some(system_time), system_time);
        assert_eq!(record.bearer_header(), Some("Bearer abc123".to_string()));
    }
}
