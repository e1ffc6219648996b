//! Compiles the error-tracking query DSL into parameterized SQL.
//!
//! ```text
//! MATCH app = 'MyTestApp' AND ex IN ('System.NullReferenceException')
//! BETWEEN 2016-01-01 00:00:00 AND 2016-02-01 00:00:00 LIMIT 100
//! ```
//!
//! text → [`lexer::Tokenizer`] → tokens → [`parser::Parser`] → [`ast::Query`]
//! → [`sql_compiler::SqlGenerator`] → [`payload::SqlPayload`]

pub mod ast;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod payload;
pub mod sql_compiler;
pub mod token;

use config::CompilerConfig;
use lexer::Tokenizer;
use log::debug;
use parser::{Parser, SyntaxError};
use payload::SqlPayload;
use sql_compiler::{GenerationError, SqlGenerator};
use thiserror::Error;

/// A failed pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("SQL generation failed: {0}")]
    Generation(#[from] GenerationError),
}

/// Runs the whole pipeline with one tokenizer strategy.
pub struct Compiler {
    tokenizer: Box<dyn Tokenizer>,
    generator: SqlGenerator,
}

impl Compiler {
    pub fn new() -> Self {
        Self::from_config(CompilerConfig::default())
    }

    pub fn from_config(config: CompilerConfig) -> Self {
        Self {
            tokenizer: config.tokenizer.build(),
            generator: SqlGenerator::with_line_ending(config.line_ending),
        }
    }

    pub fn with_tokenizer(tokenizer: Box<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            generator: SqlGenerator::new(),
        }
    }

    pub fn parse(&self, input: &str) -> Result<ast::Query, SyntaxError> {
        let tokens = self.tokenizer.tokenize(input);
        debug!("tokenized {} byte(s) into {} token(s)", input.len(), tokens.len());
        Parser::new(&tokens).parse()
    }

    pub fn compile(&self, input: &str) -> Result<SqlPayload, Error> {
        let query = self.parse(input)?;
        Ok(self.generator.generate(&query)?)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
