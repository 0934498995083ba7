//! Fluent Elasticsearch query builder
//!
//! Translates a small SQL-like condition grammar into Elasticsearch Query
//! DSL and unwraps search/get responses back into plain records.
//!
//! ```no_run
//! use est::{ClientConfig, EsClient, FindResult};
//!
//! # async fn run() -> est::Result<()> {
//! let client = EsClient::new(ClientConfig::default().with_credentials("elastic", "changeme"))?;
//!
//! let adults = client
//!     .table("users")
//!     .filter("age>=? AND status=?", [serde_json::json!(18), serde_json::json!("active")])
//!     .page(1)
//!     .find()
//!     .await?;
//! if let FindResult::Page(page) = adults {
//!     println!("{} of {}", page.records.len(), page.total);
//! }
//!
//! client.table("users").filter("id=?", [42]).increment("logins", 1.0).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Condition grammar
//!
//! - comparators: `=`, `>`, `>=`, `<`, `<=`, `<>`
//! - connectives: `AND` / `OR`, case-insensitive, equal precedence, left to right
//! - a lone `id` condition addresses the document identity instead of filtering

pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod query;
pub mod response;
pub mod transport;

pub use client::{EsClient, PreparedRequest, QueryBuilder, SortOrder};
pub use config::{ClientConfig, Protocol};
pub use error::{EstError, ParseError, TransportError};
pub use pagination::PageRequest;
pub use query::RangeMapping;
pub use response::{FindResult, PageResult, Record, WriteResponse};
pub use transport::{HttpTransport, Method, Transport, TransportRequest, TransportResponse};

/// Result type for est operations
pub type Result<T> = std::result::Result<T, EstError>;
