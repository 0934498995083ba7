//! Condition AST types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved field name that addresses a document's `_id`
pub const IDENTITY_KEY: &str = "id";

/// Comparison operator of a single condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
}

impl Comparator {
    /// Operator tokens, multi-character ones first so `>=` is never read as `>`
    pub const TOKENS: [(&'static str, Comparator); 6] = [
        (">=", Comparator::Gte),
        ("<=", Comparator::Lte),
        ("<>", Comparator::Ne),
        (">", Comparator::Gt),
        ("<", Comparator::Lt),
        ("=", Comparator::Eq),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Ne => "<>",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::TOKENS
            .iter()
            .find(|(token, _)| *token == s)
            .map(|(_, op)| *op)
            .ok_or_else(|| format!("unknown comparator '{}'", s))
    }
}

/// A single `field OP value` triple
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Condition {
    pub field: String,
    pub value: String,
    pub comparator: Comparator,
}

impl Condition {
    pub fn new(field: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            comparator,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.field == IDENTITY_KEY
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.comparator, self.value)
    }
}

/// Boolean connective between two conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// Parsed condition tree. `AND` and `OR` share one precedence level and
/// associate to the left, so `a OR b AND c` is `(a OR b) AND c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    Single(Condition),
    And(Box<ConditionExpr>, Box<ConditionExpr>),
    Or(Box<ConditionExpr>, Box<ConditionExpr>),
}

impl ConditionExpr {
    pub fn combine(self, connective: Connective, rhs: ConditionExpr) -> Self {
        match connective {
            Connective::And => ConditionExpr::And(Box::new(self), Box::new(rhs)),
            Connective::Or => ConditionExpr::Or(Box::new(self), Box::new(rhs)),
        }
    }

    pub fn is_compound(&self) -> bool {
        !matches!(self, ConditionExpr::Single(_))
    }

    /// Leaf conditions in source order
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            ConditionExpr::Single(c) => out.push(c),
            ConditionExpr::And(l, r) | ConditionExpr::Or(l, r) => {
                l.collect(out);
                r.collect(out);
            }
        }
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionExpr::Single(c) => write!(f, "{}", c),
            ConditionExpr::And(l, r) => write!(f, "{} AND {}", l, r),
            ConditionExpr::Or(l, r) => write!(f, "{} OR {}", l, r),
        }
    }
}

/// Result of parsing one `Where` expression: either an identity or a
/// condition tree, never both
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCondition {
    Identity(String),
    Expr(ConditionExpr),
}
