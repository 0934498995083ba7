//! Compiles condition trees into Elasticsearch Query DSL

use super::dsl::{BoolQuery, EsQuery, RangeBound, RangeParams, SearchBody};
use super::types::{Comparator, Condition, ConditionExpr};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

/// How `>`, `>=`, `<`, `<=` map onto range bounds.
///
/// `Legacy` reproduces the historical inverted mapping where the inclusive
/// bound is attached to the strict operator (`>` becomes `gte`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMapping {
    #[default]
    Standard,
    Legacy,
}

impl RangeMapping {
    pub fn bound(&self, comparator: Comparator) -> Option<RangeBound> {
        let bound = match (self, comparator) {
            (RangeMapping::Standard, Comparator::Gt) => RangeBound::Gt,
            (RangeMapping::Standard, Comparator::Gte) => RangeBound::Gte,
            (RangeMapping::Standard, Comparator::Lt) => RangeBound::Lt,
            (RangeMapping::Standard, Comparator::Lte) => RangeBound::Lte,
            (RangeMapping::Legacy, Comparator::Gt) => RangeBound::Gte,
            (RangeMapping::Legacy, Comparator::Gte) => RangeBound::Gt,
            (RangeMapping::Legacy, Comparator::Lt) => RangeBound::Lte,
            (RangeMapping::Legacy, Comparator::Lte) => RangeBound::Lt,
            (_, Comparator::Eq | Comparator::Ne) => return None,
        };
        Some(bound)
    }
}

/// Translates parsed conditions to a search body
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler {
    mapping: RangeMapping,
}

impl QueryCompiler {
    pub fn new(mapping: RangeMapping) -> Self {
        Self { mapping }
    }

    /// Compile a sequence of expressions, ANDed in order, into
    /// `{"query":{"bool":{"must":[...]}}}`
    pub fn compile(&self, expressions: &[ConditionExpr]) -> SearchBody {
        let mut must = Vec::new();
        for expr in expressions {
            self.compile_conjunction(expr, &mut must);
        }

        SearchBody {
            query: EsQuery::Bool(BoolQuery::must(must)),
        }
    }

    /// Compile one condition. `NE` has no clause and yields `None`.
    pub fn compile_condition(&self, condition: &Condition) -> Option<EsQuery> {
        let value = sniff_literal(&condition.value);

        if condition.comparator == Comparator::Eq {
            return Some(EsQuery::matching(&condition.field, value));
        }

        match self.mapping.bound(condition.comparator) {
            Some(bound) => Some(EsQuery::range(
                &condition.field,
                RangeParams::bounded(bound, value),
            )),
            None => {
                debug!("Dropping unsupported condition '{}'", condition);
                None
            }
        }
    }

    fn compile_conjunction(&self, expr: &ConditionExpr, out: &mut Vec<EsQuery>) {
        match expr {
            ConditionExpr::Single(c) => out.extend(self.compile_condition(c)),
            ConditionExpr::And(l, r) => {
                self.compile_conjunction(l, out);
                self.compile_conjunction(r, out);
            }
            ConditionExpr::Or(..) => out.extend(self.compile_disjunction(expr)),
        }
    }

    fn compile_disjunction(&self, expr: &ConditionExpr) -> Option<EsQuery> {
        let mut should = Vec::new();
        self.collect_disjuncts(expr, &mut should);

        match should.len() {
            0 => None,
            1 => should.pop(),
            _ => Some(EsQuery::Bool(BoolQuery::any_of(should))),
        }
    }

    fn collect_disjuncts(&self, expr: &ConditionExpr, out: &mut Vec<EsQuery>) {
        match expr {
            ConditionExpr::Single(c) => out.extend(self.compile_condition(c)),
            ConditionExpr::Or(l, r) => {
                self.collect_disjuncts(l, out);
                self.collect_disjuncts(r, out);
            }
            ConditionExpr::And(..) => {
                let mut must = Vec::new();
                self.compile_conjunction(expr, &mut must);
                match must.len() {
                    0 => {}
                    1 => out.extend(must.pop()),
                    _ => out.push(EsQuery::Bool(BoolQuery::must(must))),
                }
            }
        }
    }
}

/// Significant decimal digits any `f64` reproduces exactly
const F64_EXACT_DIGITS: usize = 15;

/// Numeric strings become JSON numbers, everything else a JSON string.
///
/// Match semantics differ between numeric and keyword fields, so `"18"` must
/// reach the engine as `18`. Integers beyond `u64` and decimals with more
/// digits than an `f64` holds stay strings so they are never rounded.
pub fn sniff_literal(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Value::from(n);
    }

    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && significant_digits(raw) <= F64_EXACT_DIGITS => {
            Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string()))
        }
        _ => Value::String(raw.to_string()),
    }
}

fn significant_digits(raw: &str) -> usize {
    let mantissa = raw.split(['e', 'E']).next().unwrap_or(raw);
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}
