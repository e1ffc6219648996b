//! The query model produced by the parser and consumed by the SQL generator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The root of the AST: one complete `MATCH ... BETWEEN ... [LIMIT n]` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub date_range: DateRange,
    pub limit: Option<u32>,
    /// Conditions in source order.
    pub match_conditions: Vec<MatchCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

/// One predicate, e.g. `app = 'MyTestApp'` or `ex IN ('A', 'B')`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCondition {
    pub object: DslObject,
    pub operator: DslOperator,
    pub value: ConditionValue,
    /// The logical operator between this condition and the next one.
    /// `None` on the last condition.
    pub connector: Option<LogicalOperator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionValue {
    /// Operand of `=`, `!=`, `LIKE` and `NOT LIKE`.
    Single(String),
    /// Operands of `IN` and `NOT IN`.
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DslObject {
    Application,
    ExceptionType,
    Fingerprint,
    Message,
    StackFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DslOperator {
    Equals,    // =
    NotEquals, // !=
    Like,
    NotLike,
    In,
    NotIn,
}

impl DslOperator {
    /// `IN` and `NOT IN` take a value list, the rest a single value.
    pub fn is_set_operator(self) -> bool {
        matches!(self, DslOperator::In | DslOperator::NotIn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}
