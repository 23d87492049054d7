//! brace parser
//!
//! A small grammar-driven shift-reduce parser. A grammar written as plain
//! text (`LHS = RHS1 ... RHSn .`, one production per line) is compiled once
//! into a [`DecisionTable`]; the [`Parser`] then consumes a token stream,
//! asking the table what to do with the top of a transactional [`Stack`]
//! until the accept rule fires.
//!
//! The machinery is generic over the [`Symbol`] type. The [`template`] module
//! instantiates it for brace templates.
//!
//! ```text
//! grammar text → Grammar → DecisionTable ─┐
//! tokens ─────────────────────────────────┴→ Parser → parse tree
//! ```

pub mod error;
pub mod grammar;
pub mod item;
pub mod parser;
pub mod rank;
pub mod stack;
pub mod table;
pub mod template;
pub mod tree;

use std::fmt;
use std::hash::Hash;

pub use error::{DecisionError, GrammarError, ParseError, ReduceError};
pub use grammar::{Grammar, Rule, SymbolSet};
pub use item::{Action, Item};
pub use parser::{ParseOptions, Parser, TrailingInput};
pub use rank::ErrorRank;
pub use stack::Stack;
pub use table::DecisionTable;
pub use tree::{print_tree, TreeNode};

/// A grammar symbol: a terminal produced by a lexer, or a nonterminal
/// introduced as the left hand side of a rule.
pub trait Symbol: Copy + Ord + Hash + fmt::Debug + fmt::Display + 'static {
    /// Resolve a name used in grammar text.
    fn from_name(name: &str) -> Option<Self>;

    fn is_terminal(&self) -> bool;

    /// The symbol whose reduction ends a parse (end of input).
    fn is_accept(&self) -> bool;
}
