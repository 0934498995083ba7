//! Read-side commands: `find` and `get`.

use anyhow::{bail, Context, Result};
use est::{EsClient, SortOrder};
use serde_json::Value;

/// Flags accepted by `est find`.
#[derive(Debug, Default)]
pub struct FindOptions {
    pub condition: Option<String>,
    pub args: Vec<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
}

/// Run a search and print the records (or paging envelope) as JSON.
pub async fn run_find(client: &EsClient, table: &str, opts: FindOptions) -> Result<()> {
    let mut query = client.table(table);

    match &opts.condition {
        Some(condition) => {
            let values = opts.args.iter().cloned().map(Value::String);
            query = query.filter(condition, values);
        }
        None if !opts.args.is_empty() => bail!("--arg given without --where"),
        None => {}
    }

    if let Some(sort) = &opts.sort {
        let (field, order) = parse_sort(sort)?;
        query = query.sort(field, order);
    }
    if let Some(size) = opts.page_size {
        query = query.page_size(size);
    }
    if let Some(page) = opts.page {
        query = query.page(page);
    }

    let result = query.find().await?;
    tracing::info!("Found {} records in '{}'", result.records().len(), table);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Fetch a single document by id.
pub async fn run_get(client: &EsClient, table: &str, id: &str) -> Result<()> {
    let record = client.table(table).id(id).get().await?;
    if record.is_empty() {
        println!("Document '{}' not found in '{}'", id, table);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn parse_sort(sort: &str) -> Result<(&str, SortOrder)> {
    let (field, order) = match sort.split_once(':') {
        Some((field, order)) => (field.trim(), order.trim()),
        None => (sort.trim(), "asc"),
    };
    if field.is_empty() {
        bail!("Empty sort field in '{}'", sort);
    }
    let order = order
        .parse::<SortOrder>()
        .with_context(|| format!("Invalid sort order in '{}'", sort))?;
    Ok((field, order))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        let (field, order) = parse_sort("age:desc").unwrap();
        assert_eq!(field, "age");
        assert_eq!(order, SortOrder::Desc);

        let (field, order) = parse_sort("name").unwrap();
        assert_eq!(field, "name");
        assert_eq!(order, SortOrder::Asc);
    }

    #[test]
    fn test_parse_sort_rejects_bad_input() {
        assert!(parse_sort(":asc").is_err());
        assert!(parse_sort("age:sideways").is_err());
    }
}
