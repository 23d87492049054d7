//! brace lexer
//!
//! Tokenizes template text into a stream of tokens: literal text runs,
//! whitespace runs, line breaks and the pieces of `{{ .Name }}` placeholders.
//! The stream always ends with an `Eof` token, and each token links to its
//! successor through [`Token::lookahead`].
//!
//! # Example
//!
//! ```
//! use brace_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("").unwrap();
//! assert_eq!(tokens.len(), 1); // Just EOF
//! assert_eq!(tokens[0].kind, TokenKind::Eof);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::{Scanner, ScannerMode};
pub use token::{Lookahead, Span, Token, TokenData, TokenKind};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("Lexer error at character {index}: invalid UTF-8 encoding")]
    InvalidEncoding { index: usize },

    #[error("Lexer error at line {line}, column {column}: unexpected character {ch:?}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("Lexer error at line {line}, column {column}: unexpected end of input")]
    UnexpectedEnd { line: usize, column: usize },

    #[error("Lexer error at line {line}, column {column}: expected '\\n' after '\\r'")]
    MalformedEscape { line: usize, column: usize },
}
