//! Recursive-descent parser for `Where` expressions
//!
//! ```text
//! expr       := condition (connective condition)*
//! connective := AND | OR
//! condition  := field comparator value
//! ```
//!
//! Connectives share one precedence level and associate to the left.

use super::lexer::{self, Token};
use super::types::{ConditionExpr, ParsedCondition};
use crate::error::ParseError;
use serde_json::Value;
use std::iter::Peekable;
use std::vec::IntoIter;

pub struct ConditionParser;

impl ConditionParser {
    /// Substitute `values` into `expression` and parse the result.
    ///
    /// A lone `id` condition is returned as [`ParsedCondition::Identity`];
    /// everything else becomes a condition tree.
    pub fn parse(expression: &str, values: &[Value]) -> Result<ParsedCondition, ParseError> {
        let substituted = lexer::substitute(expression, values)?;
        Self::parse_substituted(&substituted)
    }

    /// Parse an expression whose values are already inline
    pub fn parse_substituted(expression: &str) -> Result<ParsedCondition, ParseError> {
        let tokens = lexer::tokenize(&lexer::normalize(expression))?;
        let expr = Self::parse_expr(&mut tokens.into_iter().peekable())?;

        match expr {
            ConditionExpr::Single(c) if c.is_identity() => Ok(ParsedCondition::Identity(c.value)),
            expr => {
                if let Some(id) = expr.conditions().into_iter().find(|c| c.is_identity()) {
                    return Err(ParseError::IdentityInCompound(id.to_string()));
                }
                Ok(ParsedCondition::Expr(expr))
            }
        }
    }

    fn parse_expr(tokens: &mut Peekable<IntoIter<Token>>) -> Result<ConditionExpr, ParseError> {
        let mut left = Self::parse_condition(tokens)?;

        while let Some(Token::Connective(connective)) = tokens.peek().cloned() {
            tokens.next();
            let right = Self::parse_condition(tokens)?;
            left = left.combine(connective, right);
        }

        Ok(left)
    }

    fn parse_condition(
        tokens: &mut Peekable<IntoIter<Token>>,
    ) -> Result<ConditionExpr, ParseError> {
        match tokens.next() {
            Some(Token::Clause(clause)) => Ok(ConditionExpr::Single(lexer::split_clause(&clause)?)),
            Some(Token::Connective(_)) | None => Err(ParseError::DanglingConnective),
        }
    }
}
