//! Elasticsearch Query DSL types
//!
//! The subset of the Query DSL that compiled conditions are emitted as.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root search request body: `{"query": {...}}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchBody {
    pub query: EsQuery,
}

/// ES Query types
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EsQuery {
    /// Match query (analyzed full-text)
    Match(BTreeMap<String, MatchQuery>),

    /// Range query
    Range(BTreeMap<String, RangeParams>),

    /// Bool query
    Bool(BoolQuery),
}

impl EsQuery {
    pub fn matching(field: &str, query: Value) -> Self {
        EsQuery::Match(BTreeMap::from([(
            field.to_string(),
            MatchQuery {
                query,
                minimum_should_match: "100%".to_string(),
            },
        )]))
    }

    pub fn range(field: &str, params: RangeParams) -> Self {
        EsQuery::Range(BTreeMap::from([(field.to_string(), params)]))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MatchQuery {
    pub query: Value,
    pub minimum_should_match: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RangeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
}

/// Which side of a range a bound sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Gte,
    Gt,
    Lte,
    Lt,
}

impl RangeParams {
    pub fn bounded(bound: RangeBound, value: Value) -> Self {
        let mut params = RangeParams::default();
        match bound {
            RangeBound::Gte => params.gte = Some(value),
            RangeBound::Gt => params.gt = Some(value),
            RangeBound::Lte => params.lte = Some(value),
            RangeBound::Lt => params.lt = Some(value),
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must: Option<Vec<EsQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should: Option<Vec<EsQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn must(clauses: Vec<EsQuery>) -> Self {
        Self {
            must: Some(clauses),
            ..Default::default()
        }
    }

    pub fn any_of(clauses: Vec<EsQuery>) -> Self {
        Self {
            should: Some(clauses),
            minimum_should_match: Some(1),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_match() {
        let q = EsQuery::matching("name", json!("bob"));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"match": {"name": {"query": "bob", "minimum_should_match": "100%"}}})
        );
    }

    #[test]
    fn test_serialize_range_skips_empty_bounds() {
        let q = EsQuery::range("age", RangeParams::bounded(RangeBound::Gte, json!(18)));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"range": {"age": {"gte": 18}}})
        );
    }

    #[test]
    fn test_serialize_empty_must_is_kept() {
        let body = SearchBody {
            query: EsQuery::Bool(BoolQuery::must(vec![])),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"query": {"bool": {"must": []}}})
        );
    }

    #[test]
    fn test_serialize_any_of() {
        let q = EsQuery::Bool(BoolQuery::any_of(vec![EsQuery::matching("a", json!(1))]));
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"bool": {
                "should": [{"match": {"a": {"query": 1, "minimum_should_match": "100%"}}}],
                "minimum_should_match": 1
            }})
        );
    }

    #[test]
    fn test_deserialize_range() {
        let q: EsQuery = serde_json::from_value(json!({"range": {"ts": {"lt": "2024-01-01"}}})).unwrap();
        match q {
            EsQuery::Range(fields) => {
                assert_eq!(fields["ts"].lt, Some(json!("2024-01-01")));
                assert!(fields["ts"].gte.is_none());
            }
            _ => panic!("Expected Range"),
        }
    }
}
