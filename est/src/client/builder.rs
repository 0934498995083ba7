//! Per-request query builder

use super::{EsClient, PreparedRequest};
use crate::error::{EstError, ParseError};
use crate::pagination::PageRequest;
use crate::query::{ConditionExpr, ConditionParser, ParsedCondition, SearchBody};
use crate::response::{FindResult, PageResult, Record, ResponseUnwrapper, WriteResponse};
use crate::transport::{Method, Transport};
use crate::Result;
use reqwest::Url;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

impl std::str::FromStr for SortOrder {
    type Err = EstError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(EstError::Configuration(format!(
                "unknown sort order '{}'",
                other
            ))),
        }
    }
}

/// Transient state of one logical request.
///
/// Terminal operations take the builder by value; start the next request
/// from [`EsClient::query`] or [`EsClient::table`].
pub struct QueryBuilder<'a, T: Transport> {
    client: &'a EsClient<T>,
    table: Option<String>,
    identity: Option<String>,
    conditions: Vec<ConditionExpr>,
    sort: Option<(String, SortOrder)>,
    page: PageRequest,
    error: Option<ParseError>,
}

impl<'a, T: Transport> QueryBuilder<'a, T> {
    pub(crate) fn new(client: &'a EsClient<T>, table: Option<String>) -> Self {
        Self {
            client,
            table,
            identity: None,
            conditions: Vec::new(),
            sort: None,
            page: PageRequest::default(),
            error: None,
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a `Where` expression such as `"age>=? AND name=?"`.
    ///
    /// A lone `id` condition sets the identity used by point operations.
    /// Repeated calls are ANDed together in call order. With
    /// `strict_conditions` a parse failure is reported by the terminal
    /// call; otherwise it is logged and the expression ignored.
    #[doc(alias = "where")]
    pub fn filter<I, V>(mut self, expression: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if self.error.is_some() {
            return self;
        }

        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        match ConditionParser::parse(expression, &values) {
            Ok(ParsedCondition::Identity(id)) => self.identity = Some(id),
            Ok(ParsedCondition::Expr(expr)) => self.conditions.push(expr),
            Err(e) if self.client.config().strict_conditions => self.error = Some(e),
            Err(e) => warn!("Ignoring condition '{}': {}", expression, e),
        }
        self
    }

    /// Shorthand for `filter("id=?", [id])`
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.identity = Some(id.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page.set_page(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page.set_page_size(page_size);
        self
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn conditions(&self) -> &[ConditionExpr] {
        &self.conditions
    }

    pub fn page_request(&self) -> PageRequest {
        self.page
    }

    /// Query body for the current conditions
    pub fn compile(&self) -> SearchBody {
        self.client.compiler().compile(&self.conditions)
    }

    // ========================================
    // Request preparation
    // ========================================

    pub fn prepare_find(&self) -> Result<PreparedRequest> {
        self.check_conditions()?;
        let mut url = self.url(&["_search"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("from", &self.page.offset().to_string());
            query.append_pair("size", &self.page.page_size().to_string());
            if let Some((field, order)) = &self.sort {
                query.append_pair("sort", &format!("{}:{}", field, order));
            }
        }

        let body = self.compile();
        debug!("Compiled query: {:?}", body);
        Ok(PreparedRequest {
            method: Method::Get,
            url: url.to_string(),
            body: encode(&body)?,
        })
    }

    pub fn prepare_get(&self) -> Result<PreparedRequest> {
        let id = self.require_identity()?;
        Ok(PreparedRequest {
            method: Method::Get,
            url: self.url(&["_doc", id])?.to_string(),
            body: Vec::new(),
        })
    }

    /// Index a new document; with an identity set it is stored under that id
    pub fn prepare_add<R: Serialize + ?Sized>(&self, record: &R) -> Result<PreparedRequest> {
        self.check_conditions()?;
        let url = match self.identity.as_deref() {
            Some(id) => self.url(&["_doc", id])?,
            None => self.url(&["_doc"])?,
        };
        Ok(PreparedRequest {
            method: Method::Post,
            url: url.to_string(),
            body: encode(record)?,
        })
    }

    /// Partial update: `{"doc": record}`
    pub fn prepare_save<R: Serialize + ?Sized>(&self, record: &R) -> Result<PreparedRequest> {
        let id = self.require_identity()?;
        let doc = serde_json::to_value(record).map_err(EstError::Encoding)?;
        Ok(PreparedRequest {
            method: Method::Post,
            url: self.url(&["_update", id])?.to_string(),
            body: encode(&json!({ "doc": doc }))?,
        })
    }

    pub fn prepare_delete(&self) -> Result<PreparedRequest> {
        let id = self.require_identity()?;
        Ok(PreparedRequest {
            method: Method::Delete,
            url: self.url(&["_doc", id])?.to_string(),
            body: Vec::new(),
        })
    }

    pub fn prepare_increment(&self, field: &str, value: f64) -> Result<PreparedRequest> {
        self.prepare_script(field, "+=", value)
    }

    pub fn prepare_decrement(&self, field: &str, value: f64) -> Result<PreparedRequest> {
        self.prepare_script(field, "-=", value)
    }

    fn prepare_script(&self, field: &str, op: &str, value: f64) -> Result<PreparedRequest> {
        let id = self.require_identity()?;
        if !is_script_safe_field(field) {
            return Err(EstError::Configuration(format!(
                "field '{}' cannot be used in an update script",
                field
            )));
        }
        if !value.is_finite() {
            return Err(EstError::Configuration(format!(
                "cannot {} '{}' by {}",
                if op == "+=" { "increment" } else { "decrement" },
                field,
                value
            )));
        }

        let script = format!("ctx._source.{}{}{}", field, op, script_literal(value));
        Ok(PreparedRequest {
            method: Method::Post,
            url: self.url(&["_update", id])?.to_string(),
            body: encode(&json!({ "script": script }))?,
        })
    }

    // ========================================
    // Terminal operations
    // ========================================

    /// Search with the accumulated conditions.
    ///
    /// Unpaged requests return a bare record list, paged ones a
    /// [`PageResult`] envelope.
    pub async fn find(self) -> Result<FindResult> {
        let request = self.prepare_find()?;
        let body = self.client.execute_checked(request).await?;
        let (records, total) = ResponseUnwrapper::unwrap_search(&body)?;

        Ok(match self.page.paginate(total) {
            Some(meta) => FindResult::Page(PageResult::new(records, total, meta)),
            None => FindResult::Records(records),
        })
    }

    /// Fetch the document addressed by the identity. A missing document
    /// yields an empty record.
    pub async fn get(self) -> Result<Record> {
        let request = self.prepare_get()?;
        let id = self.require_identity()?;
        let response = self.client.execute(request).await?;

        if response.status == 404 && is_missing_document(&response.body) {
            debug!("Document {} not found", id);
            return Ok(Record::default());
        }
        if !response.is_success() {
            return Err(EstError::from_status(response.status, &response.body));
        }
        ResponseUnwrapper::unwrap_get(&response.body, id)
    }

    pub async fn add<R: Serialize + ?Sized>(self, record: &R) -> Result<WriteResponse> {
        let request = self.prepare_add(record)?;
        let body = self.client.execute_checked(request).await?;
        ResponseUnwrapper::unwrap_write(&body)
    }

    pub async fn save<R: Serialize + ?Sized>(self, record: &R) -> Result<WriteResponse> {
        let request = self.prepare_save(record)?;
        let body = self.client.execute_checked(request).await?;
        ResponseUnwrapper::unwrap_write(&body)
    }

    /// Delete the document addressed by the identity. Deleting a missing
    /// document reports `result: "not_found"` rather than an error.
    pub async fn delete(self) -> Result<WriteResponse> {
        let request = self.prepare_delete()?;
        let response = self.client.execute(request).await?;

        if response.status == 404 {
            if let Ok(ack) = ResponseUnwrapper::unwrap_write(&response.body) {
                if ack.result.as_deref() == Some("not_found") {
                    return Ok(ack);
                }
            }
        }
        if !response.is_success() {
            return Err(EstError::from_status(response.status, &response.body));
        }
        ResponseUnwrapper::unwrap_write(&response.body)
    }

    /// `field += value` via an update script
    pub async fn increment(self, field: &str, value: f64) -> Result<WriteResponse> {
        let request = self.prepare_increment(field, value)?;
        let body = self.client.execute_checked(request).await?;
        ResponseUnwrapper::unwrap_write(&body)
    }

    /// `field -= value` via an update script
    pub async fn decrement(self, field: &str, value: f64) -> Result<WriteResponse> {
        let request = self.prepare_decrement(field, value)?;
        let body = self.client.execute_checked(request).await?;
        ResponseUnwrapper::unwrap_write(&body)
    }

    // ========================================
    // Helpers
    // ========================================

    fn check_conditions(&self) -> Result<()> {
        match &self.error {
            Some(e) => Err(EstError::Condition(e.clone())),
            None => Ok(()),
        }
    }

    fn require_table(&self) -> Result<&str> {
        self.table
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EstError::Configuration("table is not set, call table(name)".into()))
    }

    fn require_identity(&self) -> Result<&str> {
        self.check_conditions()?;
        self.identity.as_deref().filter(|id| !id.is_empty()).ok_or_else(|| {
            EstError::Configuration(r#"identity is not set, use filter("id=?", [id])"#.into())
        })
    }

    /// `base/table/segments...` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let table = self.require_table()?;
        let base = self.client.config().base_url();
        let mut url = Url::parse(&base)
            .map_err(|e| EstError::Configuration(format!("invalid base url '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| EstError::Configuration(format!("'{}' cannot be a base url", base)))?
            .pop_if_empty()
            .push(table)
            .extend(segments);
        Ok(url)
    }
}

fn encode<R: Serialize + ?Sized>(value: &R) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(EstError::Encoding)
}

/// Dotted path of plain identifiers, e.g. `stats.views`
fn is_script_safe_field(field: &str) -> bool {
    field.split('.').all(|part| {
        part.chars().next().is_some_and(|c| !c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Painless literal for an update step. Whole numbers inside `i32` print as
/// int constants, everything else as a double (`3000000000.0`, `1e21`).
fn script_literal(value: f64) -> String {
    if value.fract() == 0.0 && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        format!("{}", value as i32)
    } else {
        format!("{:?}", value)
    }
}

/// A get response for an absent document: `{"found": false, ...}`
fn is_missing_document(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("found").and_then(Value::as_bool))
        == Some(false)
}
