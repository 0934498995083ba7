//! Unwraps Elasticsearch response envelopes into plain records
//!
//! Missing envelope keys degrade to empty results; keys that are present
//! with the wrong shape are reported as [`EstError::MalformedResponse`].

use crate::error::EstError;
use crate::pagination::PageMeta;
use crate::query::IDENTITY_KEY;
use crate::Result;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

/// A document body plus the identity it was stored under.
///
/// The identity is kept apart from the application fields and only merged
/// in as `id` when the record is serialized, overriding any `id` field
/// the document itself carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    id: Option<String>,
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.fields.is_empty()
    }

    /// Flatten into a single map with the identity under `id`
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = self.fields;
        if let Some(id) = self.id {
            map.insert(IDENTITY_KEY.to_string(), Value::String(id));
        }
        map
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.clone().into_map())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (k, v) in &self.fields {
            if self.id.is_some() && k == IDENTITY_KEY {
                continue;
            }
            map.serialize_entry(k, v)?;
        }
        if let Some(id) = &self.id {
            map.serialize_entry(IDENTITY_KEY, id)?;
        }
        map.end()
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    #[serde(rename = "data")]
    pub records: Vec<Record>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    #[serde(rename = "page_num")]
    pub page_count: u64,
}

impl PageResult {
    pub fn new(records: Vec<Record>, total: u64, meta: PageMeta) -> Self {
        Self {
            records,
            total,
            page: meta.page,
            page_size: meta.page_size,
            page_count: meta.page_count,
        }
    }
}

/// Outcome of a find: a bare sequence when unpaged, an envelope otherwise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FindResult {
    Records(Vec<Record>),
    Page(PageResult),
}

impl FindResult {
    pub fn records(&self) -> &[Record] {
        match self {
            FindResult::Records(records) => records,
            FindResult::Page(page) => &page.records,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            FindResult::Records(records) => records,
            FindResult::Page(page) => page.records,
        }
    }

    pub fn page(&self) -> Option<&PageResult> {
        match self {
            FindResult::Page(page) => Some(page),
            FindResult::Records(_) => None,
        }
    }
}

/// Acknowledgement of an index/update/delete call
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WriteResponse {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    hits: Option<HitsEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Option<Vec<HitEnvelope>>,
}

/// `hits.total` is an object since ES 7 and a bare count before that
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Object { value } | TotalHits::Count(value) => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HitEnvelope {
    #[serde(rename = "_id", default)]
    id: Option<String>,
    #[serde(rename = "_source", default)]
    source: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct GetEnvelope {
    #[serde(rename = "_source", default)]
    source: Option<Map<String, Value>>,
}

/// Response unwrapper
pub struct ResponseUnwrapper;

impl ResponseUnwrapper {
    /// Extract the hit records and the total count from a search response.
    ///
    /// Hits without an `_id` are skipped; `total` is reported as sent.
    pub fn unwrap_search(body: &[u8]) -> Result<(Vec<Record>, u64)> {
        let envelope: SearchEnvelope = decode(body)?;
        let Some(hits) = envelope.hits else {
            return Ok((Vec::new(), 0));
        };

        let total = hits.total.as_ref().map(TotalHits::value).unwrap_or(0);
        let records = hits
            .hits
            .unwrap_or_default()
            .into_iter()
            .filter_map(|hit| match hit.id {
                Some(id) => Some(Record::new(id, hit.source.unwrap_or_default())),
                None => {
                    debug!("Skipping search hit without _id");
                    None
                }
            })
            .collect();

        Ok((records, total))
    }

    /// Extract `_source` from a get-by-id response, tagged with `identity`.
    ///
    /// A response without `_source` yields an empty record.
    pub fn unwrap_get(body: &[u8], identity: &str) -> Result<Record> {
        let envelope: GetEnvelope = decode(body)?;
        Ok(envelope
            .source
            .map(|source| Record::new(identity, source))
            .unwrap_or_default())
    }

    pub fn unwrap_write(body: &[u8]) -> Result<WriteResponse> {
        decode(body)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(EstError::MalformedResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(v: Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    // ===================================================================
    // Record
    // ===================================================================

    #[test]
    fn test_record_serializes_identity() {
        let mut fields = Map::new();
        fields.insert("name".into(), json!("a"));
        let record = Record::new("42", fields);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"name": "a", "id": "42"})
        );
    }

    #[test]
    fn test_record_identity_overrides_source_id() {
        let mut fields = Map::new();
        fields.insert("id".into(), json!(99));
        fields.insert("x".into(), json!(1));
        let record = Record::new("7", fields);
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"x": 1, "id": "7"}));
        assert_eq!(record.to_value(), json!({"x": 1, "id": "7"}));
        assert_eq!(record.get("id"), Some(&json!(99)));
    }

    #[test]
    fn test_empty_record() {
        let record = Record::default();
        assert!(record.is_empty());
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({}));
    }

    // ===================================================================
    // unwrap_search
    // ===================================================================

    #[test]
    fn test_unwrap_search() {
        let body = bytes(json!({
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "max_score": 1.0,
                "hits": [
                    {"_index": "users", "_id": "a1", "_score": 1.0, "_source": {"name": "ann", "age": 30}},
                    {"_index": "users", "_id": "b2", "_score": 0.5, "_source": {"name": "ben"}}
                ]
            }
        }));
        let (records, total) = ResponseUnwrapper::unwrap_search(&body).unwrap();
        assert_eq!(total, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to_value(), json!({"name": "ann", "age": 30, "id": "a1"}));
        assert_eq!(records[1].id(), Some("b2"));
    }

    #[test]
    fn test_unwrap_search_legacy_total() {
        let body = bytes(json!({"hits": {"total": 5, "hits": []}}));
        let (records, total) = ResponseUnwrapper::unwrap_search(&body).unwrap();
        assert!(records.is_empty());
        assert_eq!(total, 5);
    }

    #[test]
    fn test_unwrap_search_without_hits() {
        let body = bytes(json!({"acknowledged": true}));
        let (records, total) = ResponseUnwrapper::unwrap_search(&body).unwrap();
        assert!(records.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_unwrap_search_hit_without_source() {
        let body = bytes(json!({"hits": {"total": {"value": 1}, "hits": [{"_id": "x"}]}}));
        let (records, _) = ResponseUnwrapper::unwrap_search(&body).unwrap();
        assert_eq!(records[0].to_value(), json!({"id": "x"}));
    }

    #[test]
    fn test_unwrap_search_skips_hit_without_id() {
        let body = bytes(json!({"hits": {"total": {"value": 2}, "hits": [
            {"_source": {"name": "orphan"}},
            {"_id": "b2", "_source": {"name": "ben"}}
        ]}}));
        let (records, total) = ResponseUnwrapper::unwrap_search(&body).unwrap();
        assert_eq!(total, 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].to_value(), json!({"name": "ben", "id": "b2"}));
    }

    #[test]
    fn test_unwrap_search_wrong_shape() {
        let body = bytes(json!({"hits": {"hits": "nope"}}));
        assert!(matches!(
            ResponseUnwrapper::unwrap_search(&body),
            Err(EstError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_unwrap_search_not_json() {
        assert!(matches!(
            ResponseUnwrapper::unwrap_search(b"<html>"),
            Err(EstError::MalformedResponse(_))
        ));
    }

    // ===================================================================
    // unwrap_get / unwrap_write
    // ===================================================================

    #[test]
    fn test_unwrap_get() {
        let body = bytes(json!({
            "_index": "users", "_id": "42", "found": true,
            "_source": {"name": "a", "age": 3}
        }));
        let record = ResponseUnwrapper::unwrap_get(&body, "42").unwrap();
        assert_eq!(record.to_value(), json!({"name": "a", "age": 3, "id": "42"}));
    }

    #[test]
    fn test_unwrap_get_not_found() {
        let body = bytes(json!({"_index": "users", "_id": "42", "found": false}));
        let record = ResponseUnwrapper::unwrap_get(&body, "42").unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_unwrap_write() {
        let body = bytes(json!({
            "_index": "users", "_id": "abc", "_version": 2, "result": "updated",
            "_shards": {"total": 2, "successful": 1, "failed": 0}
        }));
        let resp = ResponseUnwrapper::unwrap_write(&body).unwrap();
        assert_eq!(resp.id.as_deref(), Some("abc"));
        assert_eq!(resp.version, Some(2));
        assert_eq!(resp.result.as_deref(), Some("updated"));
    }

    // ===================================================================
    // FindResult
    // ===================================================================

    #[test]
    fn test_find_result_page_serialization() {
        let page = PageResult::new(
            vec![Record::new("1", Map::new())],
            11,
            PageMeta {
                page: 2,
                page_size: 10,
                page_count: 2,
            },
        );
        assert_eq!(
            serde_json::to_value(FindResult::Page(page)).unwrap(),
            json!({"data": [{"id": "1"}], "total": 11, "page": 2, "page_size": 10, "page_num": 2})
        );
    }

    #[test]
    fn test_find_result_bare_serialization() {
        let result = FindResult::Records(vec![Record::new("1", Map::new())]);
        assert_eq!(serde_json::to_value(&result).unwrap(), json!([{"id": "1"}]));
        assert_eq!(result.records().len(), 1);
        assert!(result.page().is_none());
    }
}
