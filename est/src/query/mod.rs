//! Condition grammar and Query DSL compilation

pub mod compiler;
pub mod dsl;
pub mod lexer;
pub mod parser;
pub mod types;

pub use compiler::{sniff_literal, QueryCompiler, RangeMapping};
pub use dsl::SearchBody;
pub use parser::ConditionParser;
pub use types::{
    Comparator, Condition, ConditionExpr, Connective, ParsedCondition, IDENTITY_KEY,
};
