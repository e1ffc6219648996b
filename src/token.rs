//! The token definitions and the pattern table shared by both tokenizers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// A token is a single unit of the language, with a kind, its text and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The matched text. For string literals this excludes the quotes.
    pub value: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, value: &'a str, span: Span) -> Self {
        Self { kind, value, span }
    }

    /// The terminator token placed at byte offset `at`.
    pub fn terminator(at: usize) -> Self {
        Self::new(TokenKind::SequenceTerminator, "", Span::new(at, at))
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Match,   // "MATCH"
    And,     // "AND"
    Or,      // "OR"
    Between, // "BETWEEN"
    In,      // "IN"
    NotIn,   // "NOT IN"
    Limit,   // "LIMIT"

    // Objects
    Application,   // "app", "application"
    ExceptionType, // "ex", "exception"
    Fingerprint,   // "fingerprint"
    Message,       // "msg", "message"
    StackFrame,    // "sf", "stackframe"

    // Operators
    Equals,    // =
    NotEquals, // !=
    Like,      // "LIKE"
    NotLike,   // "NOT LIKE"

    // Punctuation
    Comma,            // ,
    OpenParenthesis,  // (
    CloseParenthesis, // )

    // Literals
    StringValue,
    DateTimeValue,
    Number,

    // Special
    Invalid,
    SequenceTerminator,
}

impl TokenKind {
    pub fn is_object(self) -> bool {
        matches!(
            self,
            TokenKind::Application
                | TokenKind::ExceptionType
                | TokenKind::Fingerprint
                | TokenKind::Message
                | TokenKind::StackFrame
        )
    }

    pub fn is_equality_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Equals | TokenKind::NotEquals | TokenKind::Like | TokenKind::NotLike
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Match => "MATCH",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Between => "BETWEEN",
            TokenKind::In => "IN",
            TokenKind::NotIn => "NOT IN",
            TokenKind::Limit => "LIMIT",
            TokenKind::Application => "APPLICATION",
            TokenKind::ExceptionType => "EXCEPTIONTYPE",
            TokenKind::Fingerprint => "FINGERPRINT",
            TokenKind::Message => "MESSAGE",
            TokenKind::StackFrame => "STACKFRAME",
            TokenKind::Equals => "=",
            TokenKind::NotEquals => "!=",
            TokenKind::Like => "LIKE",
            TokenKind::NotLike => "NOT LIKE",
            TokenKind::Comma => ",",
            TokenKind::OpenParenthesis => "(",
            TokenKind::CloseParenthesis => ")",
            TokenKind::StringValue => "STRINGVALUE",
            TokenKind::DateTimeValue => "DATETIMEVALUE",
            TokenKind::Number => "NUMBER",
            TokenKind::Invalid => "INVALID",
            TokenKind::SequenceTerminator => "end of query",
        };
        f.write_str(text)
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Maps a token kind to its pattern.
///
/// Every definition carries two compiled forms: one anchored at the start of
/// the haystack for the sequential lexer, one unanchored for the global scan
/// of the precedence lexer. `precedence` only matters to the latter: when two
/// matches start at the same offset the lower value wins.
#[derive(Debug)]
pub struct TokenDefinition {
    pub kind: TokenKind,
    pub precedence: u8,
    anchored: Regex,
    unanchored: Regex,
}

impl TokenDefinition {
    fn new(kind: TokenKind, pattern: &str, precedence: u8) -> Self {
        let anchored = Regex::new(&format!("(?i)^(?:{pattern})"))
            .unwrap_or_else(|e| panic!("invalid pattern for {kind:?}: {e}"));
        let unanchored = Regex::new(&format!("(?i){pattern}"))
            .unwrap_or_else(|e| panic!("invalid pattern for {kind:?}: {e}"));
        Self { kind, precedence, anchored, unanchored }
    }

    /// Matches at the very start of `input`, returning the token value and
    /// the number of bytes consumed.
    pub fn match_at_start<'a>(&self, input: &'a str) -> Option<(&'a str, usize)> {
        let caps = self.anchored.captures(input)?;
        let whole = caps.get(0)?;
        let value = caps.get(1).unwrap_or(whole).as_str();
        Some((value, whole.end()))
    }

    /// Every non-overlapping match of this pattern anywhere in `input`.
    pub fn find_all<'a>(&self, input: &'a str) -> Vec<(&'a str, Span)> {
        self.unanchored
            .captures_iter(input)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let value = caps.get(1).unwrap_or(whole).as_str();
                Some((value, Span::new(whole.start(), whole.end())))
            })
            .collect()
    }
}

/// The pattern table, in declaration order.
///
/// The order is load-bearing for the sequential lexer ("not in" must be tried
/// before "in", "not like" before "like") and breaks precedence ties for the
/// precedence lexer (date-time before number). Aliases are spelled
/// longest-first so leftmost-first alternation picks the long form.
pub static TOKEN_DEFINITIONS: Lazy<Vec<TokenDefinition>> = Lazy::new(|| {
    vec![
        TokenDefinition::new(TokenKind::And, "and", 1),
        TokenDefinition::new(TokenKind::Or, "or", 1),
        TokenDefinition::new(TokenKind::Between, "between", 1),
        TokenDefinition::new(TokenKind::Match, "match", 1),
        TokenDefinition::new(TokenKind::Limit, "limit", 1),
        TokenDefinition::new(TokenKind::NotIn, "not in", 1),
        TokenDefinition::new(TokenKind::In, "in", 1),
        TokenDefinition::new(TokenKind::NotLike, "not like", 1),
        TokenDefinition::new(TokenKind::Like, "like", 1),
        TokenDefinition::new(TokenKind::Application, "application|app", 1),
        TokenDefinition::new(TokenKind::ExceptionType, "exception|ex", 1),
        TokenDefinition::new(TokenKind::Fingerprint, "fingerprint", 1),
        TokenDefinition::new(TokenKind::Message, "message|msg", 1),
        TokenDefinition::new(TokenKind::StackFrame, "stackframe|sf", 1),
        TokenDefinition::new(TokenKind::Equals, "=", 1),
        TokenDefinition::new(TokenKind::NotEquals, "!=", 1),
        TokenDefinition::new(TokenKind::OpenParenthesis, r"\(", 1),
        TokenDefinition::new(TokenKind::CloseParenthesis, r"\)", 1),
        TokenDefinition::new(TokenKind::Comma, ",", 1),
        TokenDefinition::new(TokenKind::StringValue, "'([^']*)'", 1),
        TokenDefinition::new(TokenKind::DateTimeValue, r"\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d", 2),
        TokenDefinition::new(TokenKind::Number, r"\d+", 2),
    ]
});
