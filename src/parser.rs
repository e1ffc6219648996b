//! Recursive-descent parser for the query DSL.
//!
//! ## Parse flow
//!
//! ```text
//! parse()
//!   ├─ expect MATCH
//!   ├─ loop
//!   │    ├─ parse_match_condition()          (decided on peek(0) / peek(1))
//!   │    │    ├─ object + =, !=, LIKE, NOT LIKE → parse_equality_condition()
//!   │    │    └─ object + IN, NOT IN           → parse_in_condition()
//!   │    │                                         └─ parse_string_literal_list()
//!   │    └─ condition tail
//!   │         ├─ AND / OR  → store connector on this condition, continue
//!   │         └─ BETWEEN   → parse_date_condition(), leave loop
//!   │                          ├─ parse_date_time() AND parse_date_time()
//!   │                          └─ [parse_limit()]
//!   └─ expect end of query
//! ```
//!
//! ## Grammar
//!
//! ```text
//! Query            := MATCH MatchCondition+ EOF
//! MatchCondition   := Object InfixOrSetClause ConditionTail
//! InfixOrSetClause := (EqOp String) | ((IN | NOT IN) '(' StringList ')')
//! ConditionTail    := (AND | OR) MatchCondition
//!                   | BETWEEN DateTime AND DateTime [LIMIT Number]
//! StringList       := String (',' String)*
//! ```
//!
//! BETWEEN is mandatory and closes the condition chain; nothing but LIMIT may
//! follow it.

use crate::ast::{
    ConditionValue, DateRange, DslObject, DslOperator, LogicalOperator, MatchCondition, Query,
};
use crate::token::{Span, Token, TokenKind};
use chrono::NaiveDateTime;
use log::debug;
use thiserror::Error;

/// Date-time literals are always read in this invariant format.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EXPECTED_OBJECT: &str = "app, ex, fingerprint, msg or sf";
const EXPECTED_OPERATOR: &str = "=, !=, LIKE, NOT LIKE, IN or NOT IN";

/// The first grammar violation found in a token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected} but found: {found}")]
pub struct SyntaxError {
    pub expected: String,
    /// Text of the offending token.
    pub found: String,
    pub span: Option<Span>,
}

impl SyntaxError {
    fn new(expected: impl Into<String>, token: Token<'_>) -> Self {
        let found = match token.kind {
            TokenKind::SequenceTerminator => TokenKind::SequenceTerminator.to_string(),
            _ => token.value.to_string(),
        };
        Self {
            expected: expected.into(),
            found,
            span: Some(token.span),
        }
    }
}

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Looks `offset` tokens ahead without consuming anything. Past the end of
    /// the sequence this is a terminator.
    fn peek(&self, offset: usize) -> Token<'a> {
        self.tokens
            .get(self.position + offset)
            .copied()
            .unwrap_or_else(|| {
                let at = self.tokens.last().map_or(0, |t| t.span.end);
                Token::terminator(at)
            })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Asserts the kind of the current token without consuming it.
    fn read(&self, kind: TokenKind) -> Result<Token<'a>, SyntaxError> {
        let token = self.peek(0);
        if token.kind == kind {
            Ok(token)
        } else {
            Err(SyntaxError::new(kind.to_string(), token))
        }
    }

    /// Asserts the kind of the current token and consumes it.
    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, SyntaxError> {
        let token = self.read(kind)?;
        self.advance();
        Ok(token)
    }

    pub fn parse(&mut self) -> Result<Query, SyntaxError> {
        self.position = 0;
        self.expect(TokenKind::Match)?;

        let mut match_conditions = Vec::new();
        let (date_range, limit) = loop {
            let mut condition = self.parse_match_condition()?;
            let next = self.peek(0);
            match next.kind {
                TokenKind::And | TokenKind::Or => {
                    condition.connector = Some(if next.kind == TokenKind::And {
                        LogicalOperator::And
                    } else {
                        LogicalOperator::Or
                    });
                    self.advance();
                    match_conditions.push(condition);
                }
                TokenKind::Between => {
                    match_conditions.push(condition);
                    break self.parse_date_condition()?;
                }
                _ => return Err(SyntaxError::new("AND, OR or BETWEEN", next)),
            }
        };

        self.expect(TokenKind::SequenceTerminator)?;
        debug!(
            "parsed {} match condition(s), limit {:?}",
            match_conditions.len(),
            limit
        );

        Ok(Query {
            date_range,
            limit,
            match_conditions,
        })
    }

    fn parse_match_condition(&mut self) -> Result<MatchCondition, SyntaxError> {
        let object_token = self.peek(0);
        let object =
            object_of(object_token).ok_or_else(|| SyntaxError::new(EXPECTED_OBJECT, object_token))?;

        let operator_token = self.peek(1);
        match operator_token.kind {
            kind if kind.is_equality_operator() => self.parse_equality_condition(object),
            TokenKind::In | TokenKind::NotIn => self.parse_in_condition(object),
            _ => Err(SyntaxError::new(EXPECTED_OPERATOR, operator_token)),
        }
    }

    fn parse_equality_condition(&mut self, object: DslObject) -> Result<MatchCondition, SyntaxError> {
        self.advance(); // object
        let operator_token = self.peek(0);
        let operator = operator_of(operator_token)
            .ok_or_else(|| SyntaxError::new(EXPECTED_OPERATOR, operator_token))?;
        self.advance();
        let value = self.expect(TokenKind::StringValue)?.value.to_string();

        Ok(MatchCondition {
            object,
            operator,
            value: ConditionValue::Single(value),
            connector: None,
        })
    }

    fn parse_in_condition(&mut self, object: DslObject) -> Result<MatchCondition, SyntaxError> {
        self.advance(); // object
        let operator_token = self.peek(0);
        let operator = operator_of(operator_token)
            .filter(|op| op.is_set_operator())
            .ok_or_else(|| SyntaxError::new("IN or NOT IN", operator_token))?;
        self.advance();

        self.expect(TokenKind::OpenParenthesis)?;
        let values = self.parse_string_literal_list()?;
        self.expect(TokenKind::CloseParenthesis)?;

        Ok(MatchCondition {
            object,
            operator,
            value: ConditionValue::List(values),
            connector: None,
        })
    }

    fn parse_string_literal_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut values = Vec::new();
        loop {
            values.push(self.expect(TokenKind::StringValue)?.value.to_string());
            if self.peek(0).kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }
        Ok(values)
    }

    fn parse_date_condition(&mut self) -> Result<(DateRange, Option<u32>), SyntaxError> {
        self.expect(TokenKind::Between)?;
        let from = self.parse_date_time()?;
        self.expect(TokenKind::And)?;
        let to = self.parse_date_time()?;

        let next = self.peek(0);
        let limit = match next.kind {
            TokenKind::Limit => Some(self.parse_limit()?),
            TokenKind::SequenceTerminator => None,
            _ => return Err(SyntaxError::new("LIMIT or the end of the query", next)),
        };

        Ok((DateRange { from, to }, limit))
    }

    fn parse_date_time(&mut self) -> Result<NaiveDateTime, SyntaxError> {
        let token = self.read(TokenKind::DateTimeValue)?;
        let value = NaiveDateTime::parse_from_str(token.value, DATE_TIME_FORMAT).map_err(|_| {
            SyntaxError::new("a valid date-time formatted as yyyy-MM-dd HH:mm:ss", token)
        })?;
        self.advance();
        Ok(value)
    }

    fn parse_limit(&mut self) -> Result<u32, SyntaxError> {
        self.expect(TokenKind::Limit)?;
        let token = self.peek(0);
        let limit = match token.kind {
            TokenKind::Number => token.value.parse::<u32>().ok(),
            _ => None,
        }
        .ok_or_else(|| SyntaxError::new("an integer number", token))?;
        self.advance();
        Ok(limit)
    }
}

fn object_of(token: Token<'_>) -> Option<DslObject> {
    match token.kind {
        TokenKind::Application => Some(DslObject::Application),
        TokenKind::ExceptionType => Some(DslObject::ExceptionType),
        TokenKind::Fingerprint => Some(DslObject::Fingerprint),
        TokenKind::Message => Some(DslObject::Message),
        TokenKind::StackFrame => Some(DslObject::StackFrame),
        _ => None,
    }
}

fn operator_of(token: Token<'_>) -> Option<DslOperator> {
    match token.kind {
        TokenKind::Equals => Some(DslOperator::Equals),
        TokenKind::NotEquals => Some(DslOperator::NotEquals),
        TokenKind::Like => Some(DslOperator::Like),
        TokenKind::NotLike => Some(DslOperator::NotLike),
        TokenKind::In => Some(DslOperator::In),
        TokenKind::NotIn => Some(DslOperator::NotIn),
        _ => None,
    }
}
