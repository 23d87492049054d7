//! brace templates
//!
//! Lowers parse trees into a small AST and renders it, substituting
//! `{{ .Name }}` placeholders with values from a caller-supplied record.
//!
//! ```text
//! source → Scanner → tokens → Parser → parse tree → ast::build → Template
//! Template + AttributeLookup → apply → write / render
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use brace_template::Template;
//!
//! let template = Template::parse("Hello, {{ .Name }}!").unwrap();
//! let data = HashMap::from([("Name".to_string(), "world")]);
//! assert_eq!(template.render(&data).unwrap(), "Hello, world!");
//! ```

pub mod ast;
pub mod lookup;
pub mod template;

use brace_lexer::{LexError, TokenKind};
use brace_parser::ParseError;

pub use ast::Node;
pub use lookup::{Accessors, AttributeLookup, Record};
pub use template::{Template, TemplateOptions, UnresolvedPolicy};

/// A parse tree whose shape does not match the template grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Structural error: unexpected {node}, expected {expected}")]
pub struct StructuralError {
    pub node: TokenKind,
    pub expected: &'static str,
}

/// The data record could not be consulted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("Apply error: no data record")]
    MissingRecord,

    #[error("Apply error: field {name:?} could not be read: {reason}")]
    InvalidField { name: String, reason: String },
}

/// Rendering into a sink failed.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Write error: placeholder {name:?} is unresolved")]
    Unresolved { name: String },

    #[error("Write error: sink stopped accepting bytes after {written} byte(s)")]
    PartialWrite { written: usize },

    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure along the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError<TokenKind>),

    #[error(transparent)]
    Structure(#[from] StructuralError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
