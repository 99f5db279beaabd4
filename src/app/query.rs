//! Per-instance data-fetch cache and its hydration snapshot.
//!
//! Queries are identified by a JSON key such as `["book", 42]`; the key's
//! compact JSON text is its hash. Within one render a key is fetched at most
//! once while fresh, and the whole cache is dehydrated into the response so
//! the client can resume without fetching again.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::FetchError;

/// Identity of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey {
    value: Value,
    hash: String,
}

impl QueryKey {
    pub fn new(value: Value) -> Self {
        let hash = value.to_string();
        Self { value, hash }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// How long fetched data counts as fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleTime {
    After(Duration),
    Never,
}

impl StaleTime {
    pub const fn minutes(m: u64) -> Self {
        Self::After(Duration::from_secs(m * 60))
    }

    fn is_fresh(self, updated_at_ms: i64, now_ms: i64) -> bool {
        match self {
            Self::Never => true,
            Self::After(d) => {
                let age = now_ms.saturating_sub(updated_at_ms);
                u128::try_from(age).is_ok_and(|age| age < d.as_millis())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
    Pending,
}

/// Serialized state of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub data_updated_at: i64,
    pub status: QueryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub query_key: Value,
    pub query_hash: String,
    pub state: QueryState,
}

/// Snapshot of a query cache, embedded into the page for the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HydrationState {
    #[serde(default)]
    pub queries: Vec<DehydratedQuery>,
    #[serde(default)]
    pub mutations: Vec<Value>,
}

impl HydrationState {
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty() && self.mutations.is_empty()
    }
}

#[derive(Debug, Clone)]
struct CachedQuery {
    key: Value,
    data: Value,
    updated_at: i64,
}

/// Query cache owned by exactly one application instance.
#[derive(Debug, Default)]
pub struct QueryClient {
    queries: BTreeMap<String, CachedQuery>,
    fetches: usize,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache from a snapshot. Only successful queries are taken.
    pub fn hydrate(&mut self, state: HydrationState) {
        for query in state.queries {
            if query.state.status != QueryStatus::Success {
                continue;
            }
            trace!(query = %query.query_hash, "Hydrating query");
            self.queries.insert(
                query.query_hash,
                CachedQuery {
                    key: query.query_key,
                    data: query.state.data,
                    updated_at: query.state.data_updated_at,
                },
            );
        }
    }

    /// Snapshot every cached query, ordered by hash.
    pub fn dehydrate(&self) -> HydrationState {
        HydrationState {
            queries: self
                .queries
                .iter()
                .map(|(hash, q)| DehydratedQuery {
                    query_key: q.key.clone(),
                    query_hash: hash.clone(),
                    state: QueryState {
                        data: q.data.clone(),
                        data_updated_at: q.updated_at,
                        status: QueryStatus::Success,
                    },
                })
                .collect(),
            mutations: Vec::new(),
        }
    }

    /// Return fresh cached data for `key`, or run `fetch` and cache its result.
    /// Failures are not cached.
    pub async fn fetch_query<F, Fut>(
        &mut self,
        key: &QueryKey,
        stale_time: StaleTime,
        fetch: F,
    ) -> Result<Value, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, FetchError>>,
    {
        let now = Utc::now().timestamp_millis();
        if let Some(cached) = self.queries.get(key.hash()) {
            if stale_time.is_fresh(cached.updated_at, now) {
                trace!(query = %key.hash(), "Query cache hit");
                return Ok(cached.data.clone());
            }
        }

        debug!(query = %key.hash(), "Fetching query");
        self.fetches += 1;
        let data = fetch().await?;
        self.set_query_data(key, data.clone());
        Ok(data)
    }

    pub fn get_query_data(&self, key: &QueryKey) -> Option<&Value> {
        self.queries.get(key.hash()).map(|q| &q.data)
    }

    pub fn set_query_data(&mut self, key: &QueryKey, data: Value) {
        self.queries.insert(
            key.hash().to_string(),
            CachedQuery {
                key: key.value().clone(),
                data,
                updated_at: Utc::now().timestamp_millis(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Number of fetches this client actually issued.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetches_once_while_fresh() {
        let mut client = QueryClient::new();
        let key = QueryKey::new(json!(["book", 42]));

        let first = client
            .fetch_query(&key, StaleTime::minutes(5), || async { Ok(json!({"id": 42})) })
            .await
            .unwrap();
        let second = client
            .fetch_query(&key, StaleTime::minutes(5), || async {
                panic!("fresh data must not be refetched")
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(client.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut client = QueryClient::new();
        let key = QueryKey::new(json!(["categories"]));
        let err = client
            .fetch_query(&key, StaleTime::Never, || async {
                Err(FetchError::Status {
                    url: "http://api/library/categories".into(),
                    status: 502,
                })
            })
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_hydrated_data_skips_fetch() {
        let mut source = QueryClient::new();
        let key = QueryKey::new(json!(["book", 7]));
        source.set_query_data(&key, json!({"id": 7, "titleEn": "Seven"}));
        let snapshot = source.dehydrate();

        let mut client = QueryClient::new();
        client.hydrate(snapshot);
        let data = client
            .fetch_query(&key, StaleTime::minutes(5), || async {
                panic!("hydrated data must not be refetched")
            })
            .await
            .unwrap();
        assert_eq!(data["titleEn"], "Seven");
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_hydrated_data_is_refetched() {
        let state: HydrationState = serde_json::from_value(json!({
            "queries": [{
                "queryKey": ["book", 1],
                "queryHash": "[\"book\",1]",
                "state": {"data": {"id": 1}, "dataUpdatedAt": 0, "status": "success"}
            }]
        }))
        .unwrap();

        let mut client = QueryClient::new();
        client.hydrate(state);
        let key = QueryKey::new(json!(["book", 1]));
        let data = client
            .fetch_query(&key, StaleTime::minutes(5), || async { Ok(json!({"id": 1, "fresh": true})) })
            .await
            .unwrap();
        assert_eq!(data["fresh"], true);
        assert_eq!(client.fetch_count(), 1);
    }

    #[test]
    fn test_dehydrate_wire_format() {
        let mut client = QueryClient::new();
        client.set_query_data(&QueryKey::new(json!(["categories"])), json!([]));
        let value = serde_json::to_value(client.dehydrate()).unwrap();

        assert_eq!(value["mutations"], json!([]));
        let query = &value["queries"][0];
        assert_eq!(query["queryKey"], json!(["categories"]));
        assert_eq!(query["queryHash"], "[\"categories\"]");
        assert_eq!(query["state"]["status"], "success");
        assert!(query["state"]["dataUpdatedAt"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_hydrate_ignores_failed_queries() {
        let state: HydrationState = serde_json::from_value(json!({
            "queries": [{
                "queryKey": ["book", 2],
                "queryHash": "[\"book\",2]",
                "state": {"data": null, "dataUpdatedAt": 0, "status": "error"}
            }]
        }))
        .unwrap();
        let mut client = QueryClient::new();
        client.hydrate(state);
        assert!(client.is_empty());
    }
}
