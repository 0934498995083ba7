//! Elasticsearch client
//!
//! [`EsClient`] owns the connection settings, the transport and the cached
//! auth header. Each logical request starts from a fresh
//! [`QueryBuilder`] and is consumed by its terminal call, so no condition,
//! identity or paging state survives into the next request.

mod builder;

pub use builder::{QueryBuilder, SortOrder};

use crate::config::ClientConfig;
use crate::error::EstError;
use crate::query::QueryCompiler;
use crate::transport::{
    basic_auth_header, HttpTransport, Method, Transport, TransportRequest, TransportResponse,
};
use crate::Result;
use serde_json::Value;
use tracing::{debug, warn};

/// Immutable description of one request, before headers are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub body: Vec<u8>,
}

impl PreparedRequest {
    /// Body decoded as JSON, `None` when empty
    pub fn body_json(&self) -> Option<Value> {
        if self.body.is_empty() {
            None
        } else {
            serde_json::from_slice(&self.body).ok()
        }
    }
}

pub struct EsClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    auth: Option<String>,
    compiler: QueryCompiler,
}

impl EsClient<HttpTransport> {
    /// Create a client backed by reqwest
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> EsClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let auth = config
            .user
            .as_deref()
            .map(|user| basic_auth_header(user, config.password.as_deref().unwrap_or("")));
        let compiler = QueryCompiler::new(config.range_mapping);

        Self {
            config,
            transport,
            auth,
            compiler,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Fresh builder on the configured default table
    pub fn query(&self) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self, self.config.default_table.clone())
    }

    /// Fresh builder on `table`
    pub fn table(&self, table: impl Into<String>) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self, Some(table.into()))
    }

    /// Send a prepared request and return the raw response, whatever its status
    pub async fn execute(&self, request: PreparedRequest) -> Result<TransportResponse> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(auth) = &self.auth {
            headers.push(("Authorization".to_string(), auth.clone()));
        }

        debug!(
            "{} {} ({} byte body)",
            request.method,
            request.url,
            request.body.len()
        );

        let response = self
            .transport
            .execute(TransportRequest {
                method: request.method,
                url: request.url,
                headers,
                body: request.body,
            })
            .await?;

        debug!("Response status {}", response.status);
        Ok(response)
    }

    /// Send a prepared request, turning non-success statuses into errors
    pub(crate) async fn execute_checked(&self, request: PreparedRequest) -> Result<Vec<u8>> {
        let url = request.url.clone();
        let response = self.execute(request).await?;
        if !response.is_success() {
            warn!("Elasticsearch returned {} for {}", response.status, url);
            return Err(EstError::from_status(response.status, &response.body));
        }
        Ok(response.body)
    }
}
