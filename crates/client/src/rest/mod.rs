//! View counters on a PostgREST endpoint.
//!
//! - **Read**: `GET /rest/v1/<table>?id=eq.<id>&select=<column>`
//! - **Write**: `PATCH /rest/v1/<table>?id=eq.<id>` with `{"<column>": n}`,
//!   asking for the updated rows back so a missing row is detected.
//! - **Increment**: `POST /rest/v1/rpc/<function>` with
//!   `{"pet_id_param": id, "amount_param": by}`, returning the new count.
//!
//! The read/write pair is not atomic; see `FlushMode` in the core crate.

use petrank_core::{AppConfig, CountStore, Error};
use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::{RemoteConfig, RemoteError, RemoteHttp};

/// [`CountStore`] backed by a PostgREST table.
#[derive(Debug, Clone)]
pub struct RestCountStore {
    http: RemoteHttp,
    table: String,
    column: String,
    increment_rpc: String,
}

impl RestCountStore {
    pub fn new(
        http: RemoteHttp, table: impl Into<String>, column: impl Into<String>, increment_rpc: impl Into<String>,
    ) -> Self {
        Self { http, table: table.into(), column: column.into(), increment_rpc: increment_rpc.into() }
    }

    /// Build from the application config.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let http = RemoteHttp::new(&RemoteConfig::from_app(config)?)?;
        Ok(Self::new(http, &config.count_table, &config.count_column, &config.increment_rpc))
    }

    fn row_filter(entity_id: &str) -> (&'static str, String) {
        ("id", format!("eq.{entity_id}"))
    }

    fn describe(&self, entity_id: &str) -> String {
        format!("{} id={entity_id}", self.table)
    }
}

/// Count from a PostgREST row array; an absent or null column counts as 0.
fn parse_count_rows(body: &[u8], column: &str, what: &str) -> Result<u64, RemoteError> {
    let rows: Vec<Map<String, Value>> = serde_json::from_slice(body).map_err(|e| RemoteError::Parse(e.to_string()))?;
    let row = rows.first().ok_or_else(|| RemoteError::NotFound(what.to_string()))?;

    match row.get(column) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| RemoteError::Parse(format!("{column} is not a non-negative integer: {value}"))),
    }
}

/// New count returned by the increment procedure: a bare number or a
/// single-row result.
fn parse_increment_result(body: &[u8], column: &str) -> Result<u64, RemoteError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| RemoteError::Parse(e.to_string()))?;

    let number = match &value {
        Value::Array(rows) => rows.first().and_then(|row| row.get(column)),
        Value::Object(row) => row.get(column),
        other => Some(other),
    };

    number
        .and_then(Value::as_u64)
        .ok_or_else(|| RemoteError::Parse(format!("unexpected increment result: {value}")))
}

#[async_trait::async_trait]
impl CountStore for RestCountStore {
    async fn read_count(&self, entity_id: &str) -> Result<u64, Error> {
        let what = self.describe(entity_id);
        let url = self.http.endpoint(["rest", "v1", self.table.as_str()])?;
        let request = self
            .http
            .request(Method::GET, url)
            .query(&[Self::row_filter(entity_id), ("select", self.column.clone())]);

        let response = self.http.send(request, &what).await?;
        let body = response.bytes().await.map_err(RemoteError::from)?;
        Ok(parse_count_rows(&body, &self.column, &what)?)
    }

    async fn write_count(&self, entity_id: &str, count: u64) -> Result<(), Error> {
        let what = self.describe(entity_id);
        let url = self.http.endpoint(["rest", "v1", self.table.as_str()])?;

        let mut patch = Map::new();
        patch.insert(self.column.clone(), json!(count));

        let request = self
            .http
            .request(Method::PATCH, url)
            .query(&[Self::row_filter(entity_id), ("select", self.column.clone())])
            .header("Prefer", "return=representation")
            .json(&patch);

        let response = self.http.send(request, &what).await?;
        let body = response.bytes().await.map_err(RemoteError::from)?;
        parse_count_rows(&body, &self.column, &what)?;
        Ok(())
    }

    async fn increment_count(&self, entity_id: &str, by: u64) -> Result<u64, Error> {
        let url = self.http.endpoint(["rest", "v1", "rpc", self.increment_rpc.as_str()])?;
        let request = self
            .http
            .request(Method::POST, url)
            .json(&json!({ "pet_id_param": entity_id, "amount_param": by }));

        let response = self.http.send(request, &self.increment_rpc).await?;
        let body = response.bytes().await.map_err(RemoteError::from)?;
        Ok(parse_increment_result(&body, &self.column)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_parse_count_rows() {
        assert_eq!(parse_count_rows(br#"[{"view_count": 42}]"#, "view_count", "p1").unwrap(), 42);
    }

    #[test]
    fn test_parse_null_count_is_zero() {
        assert_eq!(parse_count_rows(br#"[{"view_count": null}]"#, "view_count", "p1").unwrap(), 0);
        assert_eq!(parse_count_rows(br#"[{}]"#, "view_count", "p1").unwrap(), 0);
    }

    #[test]
    fn test_parse_missing_row() {
        let result = parse_count_rows(b"[]", "view_count", "pet_uploads id=p1");
        assert!(matches!(result, Err(RemoteError::NotFound(what)) if what == "pet_uploads id=p1"));
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert!(matches!(parse_count_rows(br#"[{"view_count": -1}]"#, "view_count", "p"), Err(RemoteError::Parse(_))));
        assert!(matches!(parse_count_rows(b"<html>", "view_count", "p"), Err(RemoteError::Parse(_))));
    }

    #[test]
    fn test_parse_increment_result_shapes() {
        assert_eq!(parse_increment_result(b"17", "view_count").unwrap(), 17);
        assert_eq!(parse_increment_result(br#"{"view_count": 18}"#, "view_count").unwrap(), 18);
        assert_eq!(parse_increment_result(br#"[{"view_count": 19}]"#, "view_count").unwrap(), 19);
        assert!(parse_increment_result(b"null", "view_count").is_err());
    }

    #[test]
    fn test_from_config_requires_remote() {
        assert!(RestCountStore::from_config(&AppConfig::default()).is_err());

        let config = AppConfig {
            remote_url: Some("https://abc.supabase.co".into()),
            remote_api_key: Some("anon".into()),
            ..Default::default()
        };
        let store = RestCountStore::from_config(&config).unwrap();
        assert_eq!(store.describe("p1"), "pet_uploads id=p1");
    }

    fn store(base_url: &str) -> RestCountStore {
        RestCountStore::new(testing::http(base_url), "pet_uploads", "view_count", "increment_pet_view_count")
    }

    #[tokio::test]
    async fn test_read_count_request() {
        let (base_url, captured) = testing::serve(vec![(200, r#"[{"view_count":7}]"#)]).await;

        assert_eq!(store(&base_url).read_count("p1").await.unwrap(), 7);

        let requests = captured.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, "GET");
        assert_eq!(request.target, "/rest/v1/pet_uploads?id=eq.p1&select=view_count");
        assert_eq!(request.header("apikey"), Some("anon-key"));
        assert_eq!(request.header("authorization"), Some("Bearer anon-key"));
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_write_count_request() {
        let (base_url, captured) = testing::serve(vec![(200, r#"[{"view_count":12}]"#)]).await;

        store(&base_url).write_count("p1", 12).await.unwrap();

        let requests = captured.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, "PATCH");
        assert_eq!(request.target, "/rest/v1/pet_uploads?id=eq.p1&select=view_count");
        assert_eq!(request.header("prefer"), Some("return=representation"));
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, json!({ "view_count": 12 }));
    }

    #[tokio::test]
    async fn test_write_count_missing_row() {
        let (base_url, _captured) = testing::serve(vec![(200, "[]")]).await;
        let result = store(&base_url).write_count("ghost", 1).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_increment_count_request() {
        let (base_url, captured) = testing::serve(vec![(200, "15")]).await;

        assert_eq!(store(&base_url).increment_count("p1", 3).await.unwrap(), 15);

        let requests = captured.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/rest/v1/rpc/increment_pet_view_count");
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, json!({ "pet_id_param": "p1", "amount_param": 3 }));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (base_url, _captured) = testing::serve(vec![(401, "{}"), (503, "{}")]).await;
        let store = store(&base_url);

        assert!(matches!(store.read_count("p1").await, Err(Error::RemoteAuth(_))));
        assert!(matches!(store.read_count("p1").await, Err(Error::Remote(msg)) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_remote_error() {
        let http = RemoteHttp::new(&RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "anon".to_string(),
            timeout: std::time::Duration::from_secs(2),
            user_agent: "petrank/0.1".to_string(),
        })
        .unwrap();
        let store = RestCountStore::new(http, "pet_uploads", "view_count", "increment_pet_view_count");

        let result = store.read_count("p1").await;
        assert!(matches!(result, Err(Error::Remote(_) | Error::RemoteTimeout(_))));
    }
}
