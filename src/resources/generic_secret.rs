//! Generic secret data source (`immutability_secret`).
//!
//! A read-only view of an arbitrary backend path. The payload is exposed twice:
//! once as canonical JSON and once flattened into a string map so that
//! heterogeneous values fit a strings-only attribute model.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, Instrument};

use crate::client::{SecretResponse, Session};
use crate::errors::{Error, Result};
use crate::lifecycle_span;
use crate::provider::{AttributeBag, DataSourceHandler};

pub const DATA_SOURCE_TYPE: &str = "immutability_secret";

/// Caller-supplied data source attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericSecretQuery {
    /// Full logical path to read
    pub path: String,
}

impl GenericSecretQuery {
    pub fn from_attributes(bag: &dyn AttributeBag) -> Result<Self> {
        Ok(Self { path: bag.require_str("path")?.to_string() })
    }
}

/// Point-in-time view of a secret.
#[derive(Clone, PartialEq, Eq)]
pub struct GenericSecretSnapshot {
    pub path: String,
    /// Backend request id; the data source identity
    pub id: String,
    pub data_json: String,
    pub data: BTreeMap<String, String>,
    pub lease_id: String,
    pub lease_duration: i64,
    pub lease_start_time: String,
    pub lease_renewable: bool,
}

impl fmt::Debug for GenericSecretSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericSecretSnapshot")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("data_keys", &self.data.keys().collect::<Vec<_>>())
            .field("lease_id", &self.lease_id)
            .field("lease_duration", &self.lease_duration)
            .field("lease_start_time", &self.lease_start_time)
            .field("lease_renewable", &self.lease_renewable)
            .finish()
    }
}

impl GenericSecretSnapshot {
    fn from_response(path: &str, response: &SecretResponse) -> Self {
        let empty = Map::new();
        let data = response.data.as_ref().unwrap_or(&empty);

        Self {
            path: path.to_string(),
            id: response.request_id.clone(),
            data_json: canonical_json(data),
            data: flatten_secret_data(data),
            lease_id: response.lease_id.clone(),
            lease_duration: response.lease_duration,
            lease_start_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            lease_renewable: response.renewable,
        }
    }

    pub fn write_to(&self, bag: &mut dyn AttributeBag) {
        bag.set_id(&self.id);
        bag.set("data_json", self.data_json.clone().into());
        bag.set("data", self.data.clone().into());
        bag.set("lease_id", self.lease_id.clone().into());
        bag.set("lease_duration", self.lease_duration.into());
        bag.set("lease_start_time", self.lease_start_time.clone().into());
        bag.set("lease_renewable", self.lease_renewable.into());
    }
}

/// Project a secret payload onto a string map.
///
/// String values are copied verbatim; every other value is replaced by its
/// JSON encoding. Encoding an already-decoded `Value` cannot fail.
pub fn flatten_secret_data(data: &Map<String, Value>) -> BTreeMap<String, String> {
    data.iter()
        .map(|(key, value)| {
            let flat = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), flat)
        })
        .collect()
}

/// JSON encoding of `data` with object keys in sorted order at every depth.
///
/// `serde_json::Map` is BTreeMap-backed while the `preserve_order` feature
/// stays off, so plain serialization already sorts keys.
pub fn canonical_json(data: &Map<String, Value>) -> String {
    Value::Object(data.clone()).to_string()
}

/// Read the secret at `query.path`.
pub async fn read(session: &Session, query: &GenericSecretQuery) -> Result<GenericSecretSnapshot> {
    debug!(path = %query.path, "Reading secret");

    let response = session
        .read(&query.path)
        .await?
        .ok_or_else(|| Error::secret_not_found(&query.path))?;

    let snapshot = GenericSecretSnapshot::from_response(&query.path, &response);
    info!(
        path = %query.path,
        request_id = %snapshot.id,
        keys = snapshot.data.len(),
        lease_duration = snapshot.lease_duration,
        "Read secret"
    );

    Ok(snapshot)
}

/// Lifecycle handler for the generic secret data source.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSecretDataSource;

#[async_trait]
impl DataSourceHandler for GenericSecretDataSource {
    fn type_name(&self) -> &'static str {
        DATA_SOURCE_TYPE
    }

    async fn read(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()> {
        let query = GenericSecretQuery::from_attributes(bag)?;
        let snapshot = read(session, &query)
            .instrument(lifecycle_span!(DATA_SOURCE_TYPE, "read", path = %query.path))
            .await?;
        snapshot.write_to(bag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AttributeValue, MapAttributes};
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_flatten_mixed_values() {
        let data = object(json!({
            "username": "svc",
            "port": 5432,
            "enabled": true,
            "nested": {"b": 1, "a": [1, 2]},
            "nothing": null
        }));

        let flat = flatten_secret_data(&data);
        assert_eq!(flat["username"], "svc");
        assert_eq!(flat["port"], "5432");
        assert_eq!(flat["enabled"], "true");
        assert_eq!(flat["nothing"], "null");
        let nested: Value = serde_json::from_str(&flat["nested"]).unwrap();
        assert_eq!(nested, json!({"a": [1, 2], "b": 1}));
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let data = object(json!({"zeta": 1, "alpha": {"y": true, "x": "v"}}));
        assert_eq!(canonical_json(&data), r#"{"alpha":{"x":"v","y":true},"zeta":1}"#);
    }

    #[test]
    fn test_snapshot_from_response() {
        let response: SecretResponse = serde_json::from_value(json!({
            "request_id": "req-9",
            "lease_id": "secret/creds/abc",
            "renewable": true,
            "lease_duration": 3600,
            "data": {"password": "hunter2"}
        }))
        .unwrap();

        let snapshot = GenericSecretSnapshot::from_response("secret/creds", &response);
        assert_eq!(snapshot.id, "req-9");
        assert_eq!(snapshot.lease_id, "secret/creds/abc");
        assert_eq!(snapshot.lease_duration, 3600);
        assert!(snapshot.lease_renewable);
        assert!(chrono::DateTime::parse_from_rfc3339(&snapshot.lease_start_time).is_ok());
        assert!(!format!("{:?}", snapshot).contains("hunter2"));

        let mut bag = MapAttributes::new().with("path", "secret/creds");
        snapshot.write_to(&mut bag);
        assert_eq!(bag.id(), Some("req-9"));
        assert_eq!(bag.string("data_json"), Some(r#"{"password":"hunter2"}"#));
        assert_eq!(bag.get("lease_renewable"), Some(&AttributeValue::Bool(true)));
    }

    #[test]
    fn test_snapshot_without_data() {
        let response: SecretResponse =
            serde_json::from_value(json!({"request_id": "req-1", "data": null})).unwrap();
        let snapshot = GenericSecretSnapshot::from_response("secret/empty", &response);
        assert_eq!(snapshot.data_json, "{}");
        assert!(snapshot.data.is_empty());
    }

    proptest! {
        #[test]
        fn prop_string_payload_flattens_verbatim(
            payload in prop::collection::btree_map("[a-z_]{1,12}", ".{0,24}", 0..8)
        ) {
            let data: Map<String, Value> = payload
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            prop_assert_eq!(flatten_secret_data(&data), payload);
        }

        #[test]
        fn prop_non_string_value_flattens_to_json(key in "[a-z]{1,8}", n in any::<i64>(), b in any::<bool>()) {
            let mut data = Map::new();
            data.insert(key.clone(), json!({"n": n, "b": b}));
            let flat = flatten_secret_data(&data);
            let decoded: Value = serde_json::from_str(&flat[&key]).unwrap();
            prop_assert_eq!(decoded, json!({"n": n, "b": b}));
        }
    }
}
