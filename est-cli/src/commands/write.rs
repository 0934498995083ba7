//! Write-side commands: add, save, delete and the counter updates.

use anyhow::{bail, Context, Result};
use est::{EsClient, WriteResponse};
use serde_json::{Map, Value};

fn parse_document(document: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(document).context("Document is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("Document must be a JSON object, got: {}", other),
    }
}

fn print_write(action: &str, response: &WriteResponse) -> Result<()> {
    tracing::info!(
        "{} '{}' in '{}': {}",
        action,
        response.id.as_deref().unwrap_or("-"),
        response.index.as_deref().unwrap_or("-"),
        response.result.as_deref().unwrap_or("unknown")
    );
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

/// Index a new document, optionally under an explicit id.
pub async fn run_add(client: &EsClient, table: &str, id: Option<&str>, document: &str) -> Result<()> {
    let record = parse_document(document)?;
    let mut query = client.table(table);
    if let Some(id) = id {
        query = query.id(id);
    }
    let response = query.add(&record).await?;
    print_write("Added", &response)
}

/// Merge fields into an existing document.
pub async fn run_save(client: &EsClient, table: &str, id: &str, document: &str) -> Result<()> {
    let record = parse_document(document)?;
    let response = client.table(table).id(id).save(&record).await?;
    print_write("Saved", &response)
}

pub async fn run_delete(client: &EsClient, table: &str, id: &str) -> Result<()> {
    let response = client.table(table).id(id).delete().await?;
    print_write("Deleted", &response)
}

pub async fn run_increment(
    client: &EsClient,
    table: &str,
    id: &str,
    field: &str,
    value: f64,
) -> Result<()> {
    let response = client.table(table).id(id).increment(field, value).await?;
    print_write("Incremented", &response)
}

pub async fn run_decrement(
    client: &EsClient,
    table: &str,
    id: &str,
    field: &str,
    value: f64,
) -> Result<()> {
    let response = client.table(table).id(id).decrement(field, value).await?;
    print_write("Decremented", &response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let doc = parse_document(r#"{"name": "alice", "age": 30}"#).unwrap();
        assert_eq!(doc["name"], "alice");
        assert_eq!(doc["age"], 30);
    }

    #[test]
    fn test_parse_document_rejects_non_objects() {
        assert!(parse_document("[1, 2]").is_err());
        assert!(parse_document("not json").is_err());
    }
}
