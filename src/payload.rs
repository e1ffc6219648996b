//! Incremental SQL text plus its ordered, named parameter bindings.

use crate::ast::{ConditionValue, DslObject};
use chrono::NaiveDateTime;
use sea_query::{Value, Values};

pub const FROM_DATE_PARAMETER: &str = "@FromDate";
pub const TO_DATE_PARAMETER: &str = "@ToDate";

/// Declared SQL type of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    VarChar(u32),
    DateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlParameter {
    pub name: String,
    pub sql_type: SqlType,
    pub value: Value,
}

/// SQL text under construction and the parameters it references.
///
/// User values are bound as `@Param1`, `@Param2`, ... in the order they are
/// added, one name per value (every element of an `IN` list gets its own).
/// `@FromDate` and `@ToDate` are bound at most once each.
#[derive(Debug, Clone)]
pub struct SqlPayload {
    sql: String,
    parameters: Vec<SqlParameter>,
    param_counter: u32,
    line_ending: &'static str,
}

impl SqlPayload {
    pub fn new(line_ending: &'static str) -> Self {
        Self {
            sql: String::new(),
            parameters: Vec::new(),
            param_counter: 0,
            line_ending,
        }
    }

    pub fn append(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn append_line(&mut self, text: &str) {
        self.sql.push_str(text);
        self.add_new_line();
    }

    pub fn add_new_line(&mut self) {
        self.sql.push_str(self.line_ending);
    }

    pub fn append_column_name(&mut self, object: DslObject) {
        self.sql.push_str(column_name(object));
    }

    /// Binds the value(s) of a condition on `object`, writing the placeholders
    /// comma-separated.
    pub fn add_condition_parameters(&mut self, object: DslObject, value: &ConditionValue) {
        match value {
            ConditionValue::Single(value) => self.add_parameter(object, value),
            ConditionValue::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sql.push(',');
                    }
                    self.add_parameter(object, value);
                }
            }
        }
    }

    pub fn add_from_date_parameter(&mut self, value: NaiveDateTime) {
        self.add_date_parameter(FROM_DATE_PARAMETER, value);
    }

    pub fn add_to_date_parameter(&mut self, value: NaiveDateTime) {
        self.add_date_parameter(TO_DATE_PARAMETER, value);
    }

    fn add_date_parameter(&mut self, name: &str, value: NaiveDateTime) {
        self.sql.push_str(name);
        if !self.parameters.iter().any(|p| p.name == name) {
            self.parameters.push(SqlParameter {
                name: name.to_string(),
                sql_type: SqlType::DateTime,
                value: Value::from(value),
            });
        }
    }

    fn add_parameter(&mut self, object: DslObject, value: &str) {
        self.param_counter += 1;
        let name = format!("@Param{}", self.param_counter);
        self.sql.push_str(&name);
        self.parameters.push(SqlParameter {
            name,
            sql_type: SqlType::VarChar(varchar_length(object)),
            value: Value::from(value.to_string()),
        });
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &[SqlParameter] {
        &self.parameters
    }

    /// The bound values in parameter order, ready for a sea-query binder.
    pub fn values(&self) -> Values {
        Values(self.parameters.iter().map(|p| p.value.clone()).collect())
    }

    pub fn into_parts(self) -> (String, Vec<SqlParameter>) {
        (self.sql, self.parameters)
    }
}

pub fn column_name(object: DslObject) -> &'static str {
    match object {
        DslObject::Application => "ED.ApplicationId",
        DslObject::Fingerprint => "ED.FingerprintText",
        DslObject::StackFrame => "EB.StackFrame",
        DslObject::ExceptionType => "EB.ExceptionType",
        DslObject::Message => "T.MessageDetails",
    }
}

pub fn varchar_length(object: DslObject) -> u32 {
    match object {
        DslObject::Application => 200,
        DslObject::StackFrame => 1000,
        DslObject::ExceptionType => 200,
        DslObject::Message => 1000,
        DslObject::Fingerprint => 32,
    }
}
