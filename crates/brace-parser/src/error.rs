//! Error types for grammar compilation and parsing.

use std::fmt;

use crate::grammar::SymbolSet;
use crate::Symbol;

/// Grammar text that cannot be compiled into rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("Grammar error: no rules")]
    Empty,

    #[error("Grammar error at line {line}: missing terminating '.'")]
    MissingTerminator { line: usize },

    #[error("Grammar error at line {line}: missing '='")]
    MissingEquals { line: usize },

    #[error("Grammar error at line {line}: empty left hand side")]
    EmptyLhs { line: usize },

    #[error("Grammar error at line {line}: expected one left hand side, got {count}")]
    MultipleLhs { line: usize, count: usize },

    #[error("Grammar error at line {line}: empty right hand side")]
    EmptyRhs { line: usize },

    #[error("Grammar error at line {line}: unknown symbol {name:?}")]
    UnknownSymbol { line: usize, name: String },

    #[error("Grammar error at line {line}: terminal {name:?} cannot be a left hand side")]
    TerminalLhs { line: usize, name: String },

    #[error("Grammar error: no rule ends with the accept symbol")]
    NoAcceptRule,

    #[error("Grammar error: {name} is used but has no rule")]
    Undefined { name: String },

    #[error("Grammar error: unit rules through {name} form a cycle")]
    Cycle { name: String },
}

/// The decision table could not pick an action for the top of the stack.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError<S: Symbol> {
    #[error("nothing to decide on: the stack is empty")]
    EmptyStack,

    #[error("unexpected token ({0})")]
    UnrecognizedSymbol(S),

    #[error("after {symbol}: expected {}, got {} instead", lookaheads(.expected), or(.got, "end of input"))]
    UnexpectedLookahead {
        symbol: S,
        expected: SymbolSet<S>,
        got: Option<S>,
    },

    #[error("expected {expected}, got {} instead", or(.got, "nothing"))]
    Mismatch { expected: S, got: Option<S> },

    #[error("{lhs} cannot start after {}", or(.got, "the start of input"))]
    UnexpectedPreceding { lhs: S, got: Option<S> },

    #[error("no rule applies to {0}")]
    NoSolution(S),

    #[error("ambiguous grammar: {symbol} matches {}", alternatives(.candidates))]
    Ambiguous { symbol: S, candidates: Vec<String> },
}

/// A reduction whose right hand side is not on the stack.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("after {lhs}: expected {expected}{}, got {} instead", before(.preceding), or(.got, "nothing"))]
pub struct ReduceError<S: Symbol> {
    pub lhs: S,
    pub expected: S,
    pub got: Option<S>,
    /// The symbol matched just before, i.e. the one that follows `expected`
    /// in the input.
    pub preceding: Option<S>,
}

/// A parse that did not end in a single accepted tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError<S: Symbol> {
    #[error("Parse error: no tokens")]
    NoTokens,

    /// `line` and `column` locate the token on top of the stack.
    #[error("Parse error at line {line}, column {column}: could not decide: {source}")]
    Decision {
        line: usize,
        column: usize,
        source: DecisionError<S>,
    },

    #[error("Parse error at line {line}, column {column}: reduce failed: {source}")]
    Reduce {
        line: usize,
        column: usize,
        source: ReduceError<S>,
    },

    #[error("Parse error: shift failed, input is exhausted")]
    InputExhausted,

    #[error("Parse error: input ended before the parse was accepted")]
    NotAccepted,

    #[error("Parse error: {count} element(s) left on the stack after accept")]
    LeftoverStack { count: usize },

    #[error("Parse error: {count} token(s) left unconsumed after accept")]
    TrailingInput { count: usize },

    #[error("Parse error: expected {expected} at the root, got {got}")]
    WrongRoot { expected: S, got: S },
}

fn or<S: fmt::Display>(symbol: &Option<S>, nothing: &str) -> String {
    match symbol {
        Some(symbol) => symbol.to_string(),
        None => nothing.to_string(),
    }
}

fn before<S: fmt::Display>(symbol: &Option<S>) -> String {
    match symbol {
        Some(symbol) => format!(" before {symbol}"),
        None => String::new(),
    }
}

fn lookaheads<S: Symbol>(expected: &SymbolSet<S>) -> String {
    expected.describe("end of input")
}

fn alternatives(candidates: &[String]) -> String {
    candidates.join(" | ")
}
