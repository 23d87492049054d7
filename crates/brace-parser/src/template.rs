//! The brace template grammar.
//!
//! A template is a non-empty run of elements: text, newlines, whitespace
//! and `{{ .Name }}` placeholders.

use std::sync::OnceLock;

use brace_lexer::{Token, TokenKind};

use crate::error::ParseError;
use crate::parser::{ParseOptions, Parser};
use crate::table::DecisionTable;
use crate::Symbol;

pub const GRAMMAR: &str = "
Source = Source1 EOF .
Source1 = Elem .
Source1 = Elem Source1 .
Elem = Variable .
Elem = text .
Elem = newline .
Elem = Sws .
Variable = op_curly dot variable_name cl_curly .
Sws = ws .
Sws = ws Sws .
";

impl Symbol for TokenKind {
    fn from_name(name: &str) -> Option<Self> {
        TokenKind::from_grammar_name(name)
    }

    fn is_terminal(&self) -> bool {
        TokenKind::is_terminal(*self)
    }

    fn is_accept(&self) -> bool {
        *self == TokenKind::Eof
    }
}

/// The compiled template grammar, built on first use and shared.
pub fn decision_table() -> &'static DecisionTable<TokenKind> {
    static TABLE: OnceLock<DecisionTable<TokenKind>> = OnceLock::new();
    TABLE.get_or_init(|| DecisionTable::new(GRAMMAR).expect("built-in template grammar is valid"))
}

/// Parse a scanned template into a tree rooted at [`TokenKind::Source`].
pub fn parse_tokens(tokens: Vec<Token>, options: &ParseOptions) -> Result<Token, ParseError<TokenKind>> {
    Parser::parse(decision_table(), tokens, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brace_lexer::Scanner;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_builds_once() {
        let a = decision_table() as *const _;
        let b = decision_table() as *const _;
        assert_eq!(a, b);
        assert_eq!(decision_table().grammar().start(), TokenKind::Source);
    }

    #[test]
    fn test_symbol_impl() {
        assert_eq!(TokenKind::from_name("op_curly"), Some(TokenKind::OpCurly));
        assert!(Symbol::is_terminal(&TokenKind::Ws));
        assert!(!Symbol::is_terminal(&TokenKind::Sws));
        assert!(TokenKind::Eof.is_accept());
        assert!(!TokenKind::Text.is_accept());
    }

    fn distinct<S: Symbol>(symbols: impl IntoIterator<Item = S>) -> usize {
        symbols.into_iter().collect::<std::collections::HashSet<S>>().len()
    }

    #[test]
    fn test_symbols_are_hashable() {
        let grammar = decision_table().grammar();
        assert_eq!(distinct(grammar.symbols()), grammar.symbols().len());
        assert_eq!(distinct(TokenKind::ALL), TokenKind::ALL.len());
        assert_eq!(distinct([TokenKind::Ws, TokenKind::Ws]), 1);
    }

    #[test]
    fn test_parse_tokens() {
        let tokens = Scanner::tokenize("Hello, {{ .Name }}!\n").unwrap();
        let root = parse_tokens(tokens, &ParseOptions::default()).unwrap();
        assert_eq!(root.kind, TokenKind::Source);
        assert_eq!(root.leaf_text(), "Hello, {{ .Name }}!\n");
    }
}
