//! Tokenizers for the query DSL.
//!
//! Two strategies share the [`Tokenizer`] contract: raw text in, an ordered
//! token sequence out, always closed by a `SequenceTerminator` token.
//!
//! - [`SequentialLexer`] tries every pattern in declaration order, anchored
//!   at the scan position, and takes the first that matches. Unmatched text
//!   becomes `Invalid` tokens. It rescans the whole table at every position.
//! - [`PrecedenceLexer`] scans the whole input once per pattern, then walks the
//!   matches by start offset, keeping the best-ranked match of each offset
//!   unless it overlaps the previously accepted token. Unmatched text is
//!   dropped.

use crate::token::{Span, Token, TokenKind, TOKEN_DEFINITIONS};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Turns query text into a token sequence terminated by `SequenceTerminator`.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&self, input: &'a str) -> Vec<Token<'a>>;
}

/// Selects a tokenizer strategy, e.g. from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    Sequential,
    #[default]
    Precedence,
}

impl TokenizerKind {
    pub fn build(self) -> Box<dyn Tokenizer> {
        match self {
            TokenizerKind::Sequential => Box::new(SequentialLexer),
            TokenizerKind::Precedence => Box::new(PrecedenceLexer),
        }
    }
}

/// First-match tokenizer over the ordered pattern table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialLexer;

impl Tokenizer for SequentialLexer {
    fn tokenize<'a>(&self, input: &'a str) -> Vec<Token<'a>> {
        let mut tokens: Vec<_> = SequentialScan::new(input).collect();
        tokens.push(Token::terminator(input.len()));
        tokens
    }
}

struct SequentialScan<'a> {
    input: &'a str,
    /// Byte offset of the scan position.
    position: usize,
}

impl<'a> SequentialScan<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn at_end(&self) -> bool {
        self.input[self.position..].chars().all(char::is_whitespace)
    }

    /// Tries each definition in order, anchored at the current position.
    fn read_definition(&mut self) -> Option<Token<'a>> {
        let input = self.input;
        let start = self.position;
        let remaining = &input[start..];
        TOKEN_DEFINITIONS.iter().find_map(|definition| {
            let (value, len) = definition.match_at_start(remaining)?;
            self.position = start + len;
            Some(Token::new(definition.kind, value, Span::new(start, start + len)))
        })
    }

    /// Reads a run of non-whitespace characters as an `Invalid` token,
    /// swallowing at most one whitespace character after it.
    fn read_invalid(&mut self) -> Token<'a> {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            self.bump();
        }
        let end = self.position;
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        debug!("invalid fragment {:?} at {}..{}", &self.input[start..end], start, end);
        Token::new(TokenKind::Invalid, &self.input[start..end], Span::new(start, end))
    }
}

impl<'a> Iterator for SequentialScan<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.at_end() {
                return None;
            }
            if let Some(token) = self.read_definition() {
                trace!("token {:?} {:?}", token.kind, token.value);
                return Some(token);
            }
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                _ => return Some(self.read_invalid()),
            }
        }
    }
}

/// Global-scan tokenizer ranking overlapping candidates by precedence.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrecedenceLexer;

#[derive(Debug)]
struct Candidate<'a> {
    kind: TokenKind,
    value: &'a str,
    span: Span,
    precedence: u8,
    /// Declaration index in the pattern table, the tie-breaker.
    order: usize,
}

impl PrecedenceLexer {
    fn find_candidates<'a>(input: &'a str) -> Vec<Candidate<'a>> {
        let mut candidates = Vec::new();
        for (order, definition) in TOKEN_DEFINITIONS.iter().enumerate() {
            for (value, span) in definition.find_all(input) {
                candidates.push(Candidate {
                    kind: definition.kind,
                    value,
                    span,
                    precedence: definition.precedence,
                    order,
                });
            }
        }
        candidates.sort_by_key(|c| (c.span.start, c.precedence, c.order));
        candidates
    }
}

impl Tokenizer for PrecedenceLexer {
    fn tokenize<'a>(&self, input: &'a str) -> Vec<Token<'a>> {
        let candidates = Self::find_candidates(input);
        let mut tokens = Vec::new();
        let mut last_end: Option<usize> = None;

        for group in candidates.chunk_by(|a, b| a.span.start == b.span.start) {
            let best = &group[0];
            if last_end.is_some_and(|end| best.span.start < end) {
                trace!("discarding overlapping {:?} at {}", best.kind, best.span.start);
                continue;
            }
            report_unmatched(input, last_end.unwrap_or(0), best.span.start);
            trace!("token {:?} {:?}", best.kind, best.value);
            tokens.push(Token::new(best.kind, best.value, best.span));
            last_end = Some(best.span.end);
        }
        report_unmatched(input, last_end.unwrap_or(0), input.len());

        tokens.push(Token::terminator(input.len()));
        tokens
    }
}

fn report_unmatched(input: &str, from: usize, to: usize) {
    let gap = input[from..to].trim();
    if !gap.is_empty() {
        debug!("dropping unmatched text {:?} at {}..{}", gap, from, to);
    }
}
