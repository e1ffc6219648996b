//! SQL generator that renders a parsed [`Query`] into the fixed error-ranking
//! statement, with the match conditions as a parameterized predicate.

use crate::ast::{ConditionValue, DslOperator, LogicalOperator, MatchCondition, Query};
use crate::payload::SqlPayload;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PROJECTION: [&str; 9] = [
    "        ED.FingerprintText",
    "        ,ED.ApplicationId",
    "        ,ED.OriginExceptionType",
    "        ,ED.OriginStackFrame",
    "        ,ED.LowestAppStackFrame",
    "        ,ED.HighestAppStackFrame",
    "        ,SUM(T.Frequency) AS TotalErrors",
    "FROM Timeline T",
    "JOIN ErrorDefinition AS ED ON T.Fingerprint = ED.Fingerprint",
];

const GROUPING: [&str; 7] = [
    "GROUP BY ED.FingerprintText",
    "        ,ED.ApplicationId",
    "        ,ED.OriginExceptionType",
    "        ,ED.OriginStackFrame",
    "        ,ED.LowestAppStackFrame",
    "        ,ED.HighestAppStackFrame",
    "ORDER BY TotalErrors DESC",
];

/// Line terminator written between the lines of the generated statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A query model the generator cannot render. Never produced for a query
/// that came out of the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("operator {operator:?} is not supported with value {value:?}")]
    UnsupportedOperator {
        operator: DslOperator,
        value: ConditionValue,
    },
    #[error("match condition {index} has no connector to the next condition")]
    MissingConnector { index: usize },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlGenerator {
    line_ending: LineEnding,
}

impl SqlGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_ending(line_ending: LineEnding) -> Self {
        Self { line_ending }
    }

    pub fn generate(&self, query: &Query) -> Result<SqlPayload, GenerationError> {
        let mut payload = SqlPayload::new(self.line_ending.as_str());

        match query.limit {
            Some(limit) => payload.append_line(&format!("SELECT TOP {limit}")),
            None => payload.append_line("SELECT"),
        }
        for line in PROJECTION {
            payload.append_line(line);
        }

        payload.append("WHERE T.ErrorDateTime BETWEEN ");
        payload.add_from_date_parameter(query.date_range.from);
        payload.append(" AND ");
        payload.add_to_date_parameter(query.date_range.to);
        payload.add_new_line();

        for (index, condition) in query.match_conditions.iter().enumerate() {
            // The connector rendered before a condition is the one stored on
            // its predecessor.
            let connector = match index {
                0 => LogicalOperator::And,
                _ => query.match_conditions[index - 1]
                    .connector
                    .ok_or(GenerationError::MissingConnector { index: index - 1 })?,
            };
            add_logical_operator(&mut payload, connector);
            add_clause(&mut payload, condition)?;
        }

        for line in GROUPING {
            payload.append_line(line);
        }

        debug!(
            "generated SQL for {} condition(s) with {} parameter(s)",
            query.match_conditions.len(),
            payload.parameters().len()
        );
        Ok(payload)
    }
}

fn add_logical_operator(payload: &mut SqlPayload, operator: LogicalOperator) {
    match operator {
        LogicalOperator::And => payload.append("AND "),
        LogicalOperator::Or => payload.append("OR "),
    }
}

fn add_clause(payload: &mut SqlPayload, condition: &MatchCondition) -> Result<(), GenerationError> {
    let (prefix, suffix) = match (&condition.operator, &condition.value) {
        (DslOperator::Equals, ConditionValue::Single(_)) => (" = ", ""),
        (DslOperator::NotEquals, ConditionValue::Single(_)) => (" <> ", ""),
        (DslOperator::Like, ConditionValue::Single(_)) => (" LIKE '%' + ", " + '%'"),
        (DslOperator::NotLike, ConditionValue::Single(_)) => (" NOT LIKE '%' + ", " + '%'"),
        (DslOperator::In, ConditionValue::List(values)) if !values.is_empty() => (" IN (", ")"),
        (DslOperator::NotIn, ConditionValue::List(values)) if !values.is_empty() => {
            (" NOT IN (", ")")
        }
        (operator, value) => {
            return Err(GenerationError::UnsupportedOperator {
                operator: *operator,
                value: value.clone(),
            })
        }
    };

    payload.append_column_name(condition.object);
    payload.append(prefix);
    payload.add_condition_parameters(condition.object, &condition.value);
    payload.append(suffix);
    payload.add_new_line();
    Ok(())
}
