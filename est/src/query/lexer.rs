//! Placeholder substitution and tokenizing for `Where` expressions
//!
//! Bound values are spliced into the template first; the resulting text is
//! then normalized (connectives uppercased) and cut into condition clauses
//! and connectives.

use super::types::{Comparator, Condition, Connective};
use crate::error::ParseError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const PLACEHOLDER: char = '?';

static COMPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">=|<=|<>|>|<|=").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Clause(String),
    Connective(Connective),
}

/// Default string rendering of a bound value
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Replace `?` placeholders left to right with the rendered values.
///
/// Values are never re-scanned, so a value that itself contains `?` is
/// inserted verbatim.
pub fn substitute(template: &str, values: &[Value]) -> Result<String, ParseError> {
    let expected = template.matches(PLACEHOLDER).count();
    if expected == 0 {
        return Err(ParseError::NoPlaceholder(template.to_string()));
    }
    if expected != values.len() {
        return Err(ParseError::PlaceholderMismatch {
            expected,
            supplied: values.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + values.len() * 8);
    let mut values = values.iter();
    for ch in template.chars() {
        if ch == PLACEHOLDER {
            if let Some(v) = values.next() {
                out.push_str(&render_value(v));
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// Uppercase whole-word `and` / `or` connectives and collapse runs of
/// whitespace to single spaces
pub fn normalize(expression: &str) -> String {
    expression
        .split_whitespace()
        .map(|word| match connective(word) {
            Some(c) => c.as_str(),
            None => word,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn connective(word: &str) -> Option<Connective> {
    if word.eq_ignore_ascii_case("and") {
        Some(Connective::And)
    } else if word.eq_ignore_ascii_case("or") {
        Some(Connective::Or)
    } else {
        None
    }
}

/// Split a normalized expression into clauses and connectives
pub fn tokenize(normalized: &str) -> Result<Vec<Token>, ParseError> {
    if normalized.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut tokens = Vec::new();
    let mut clause: Vec<&str> = Vec::new();

    for word in normalized.split_whitespace() {
        match connective(word) {
            Some(c) => {
                push_clause(&mut tokens, &clause)?;
                clause.clear();
                tokens.push(Token::Connective(c));
            }
            None => clause.push(word),
        }
    }
    push_clause(&mut tokens, &clause)?;

    Ok(tokens)
}

fn push_clause(tokens: &mut Vec<Token>, words: &[&str]) -> Result<(), ParseError> {
    if words.is_empty() {
        return Err(ParseError::DanglingConnective);
    }
    tokens.push(Token::Clause(words.join(" ")));
    Ok(())
}

/// Split one clause into its field, comparator and value.
///
/// The leftmost comparator wins; multi-character operators are preferred
/// over their single-character prefixes at the same position.
pub fn split_clause(clause: &str) -> Result<Condition, ParseError> {
    let m = COMPARATOR
        .find(clause)
        .ok_or_else(|| ParseError::MissingComparator(clause.to_string()))?;

    let field = clause[..m.start()].trim();
    let value = clause[m.end()..].trim();

    if field.is_empty() || value.is_empty() || field.contains(char::is_whitespace) {
        return Err(ParseError::MalformedCondition(clause.to_string()));
    }

    let comparator = m
        .as_str()
        .parse::<Comparator>()
        .map_err(|_| ParseError::MissingComparator(clause.to_string()))?;

    Ok(Condition::new(field, comparator, value))
}
