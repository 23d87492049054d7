use std::collections::VecDeque;

use brace_lexer::Token;

use crate::error::{DecisionError, ParseError, ReduceError};
use crate::item::Action;
use crate::stack::Stack;
use crate::table::DecisionTable;
use crate::tree::print_tree;
use crate::Symbol;

/// What to do with tokens left over once the accept rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingInput {
    /// Log a warning and return the tree.
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub trailing_input: TrailingInput,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trailing_input(mut self, policy: TrailingInput) -> Self {
        self.trailing_input = policy;
        self
    }
}

/// Shift-reduce driver over a [`DecisionTable`].
pub struct Parser<'t, S: Symbol> {
    table: &'t DecisionTable<S>,
    input: VecDeque<Token<S>>,
    stack: Stack<Token<S>>,
}

impl<'t, S: Symbol> Parser<'t, S> {
    pub fn new(table: &'t DecisionTable<S>, tokens: Vec<Token<S>>) -> Self {
        Self {
            table,
            input: tokens.into(),
            stack: Stack::new(),
        }
    }

    /// Parse `tokens` into a single tree rooted at the grammar's start symbol.
    pub fn parse(
        table: &'t DecisionTable<S>,
        tokens: Vec<Token<S>>,
        options: &ParseOptions,
    ) -> Result<Token<S>, ParseError<S>> {
        Self::new(table, tokens).run(options)
    }

    pub fn run(mut self, options: &ParseOptions) -> Result<Token<S>, ParseError<S>> {
        if !self.shift() {
            return Err(ParseError::NoTokens);
        }

        loop {
            let lookahead = match self.stack.peek() {
                Some(top) => top.lookahead.map(|la| la.kind),
                None => return Err(ParseError::NotAccepted),
            };

            let action = match self.table.decide(&mut self.stack, lookahead) {
                Ok(action) => action,
                Err(err) => {
                    self.dump_stack("no decision");
                    return Err(self.decision_error(err));
                }
            };
            log::trace!("stack depth {}, lookahead {lookahead:?}: {action}", self.stack.len());

            match action {
                Action::Shift => {
                    if !self.shift() {
                        self.dump_stack("shift past end of input");
                        return Err(ParseError::InputExhausted);
                    }
                }
                Action::Reduce(rule) => self.reduce(rule)?,
                Action::Accept(rule) => {
                    self.reduce(rule)?;
                    break;
                }
            }
        }

        self.finish(options)
    }

    fn shift(&mut self) -> bool {
        match self.input.pop_front() {
            Some(token) => {
                self.stack.push(token);
                true
            }
            None => false,
        }
    }

    fn reduce(&mut self, index: usize) -> Result<(), ParseError<S>> {
        let table = self.table;
        let rule = &table.grammar().rules()[index];
        let lhs = rule.lhs();

        let mut preceding = None;
        for &expected in rule.rhs() {
            let got = self.stack.pop().map(|token| token.kind);
            if got != Some(expected) {
                self.stack.rollback();
                self.dump_stack("reduce failed");
                let (line, column) = self.position();
                return Err(ParseError::Reduce {
                    line,
                    column,
                    source: ReduceError {
                        lhs,
                        expected,
                        got,
                        preceding,
                    },
                });
            }
            preceding = Some(expected);
        }

        let children = self.stack.take_popped();
        let node = Token::node(lhs, children).expect("rules have a non-empty right hand side");
        log::trace!("reduced {rule}");
        self.stack.push(node);
        Ok(())
    }

    fn finish(self, options: &ParseOptions) -> Result<Token<S>, ParseError<S>> {
        if !self.input.is_empty() {
            let count = self.input.len();
            match options.trailing_input {
                TrailingInput::Warn => {
                    log::warn!("parse accepted with {count} token(s) left unconsumed")
                }
                TrailingInput::Error => return Err(ParseError::TrailingInput { count }),
            }
        }

        if self.stack.len() > 1 {
            self.dump_stack("leftover stack");
            return Err(ParseError::LeftoverStack {
                count: self.stack.len() - 1,
            });
        }

        let start = self.table.grammar().start();
        let root = self
            .stack
            .into_vec()
            .pop()
            .ok_or(ParseError::NotAccepted)?;
        if root.kind != start {
            return Err(ParseError::WrongRoot {
                expected: start,
                got: root.kind,
            });
        }
        Ok(root)
    }

    fn decision_error(&self, source: DecisionError<S>) -> ParseError<S> {
        let (line, column) = self.position();
        ParseError::Decision { line, column, source }
    }

    /// Line and column of the top of the stack.
    fn position(&self) -> (usize, usize) {
        self.stack
            .peek()
            .map(|token| (token.span.line, token.span.column))
            .unwrap_or_default()
    }

    fn dump_stack(&self, reason: &str) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        log::debug!("{reason}; {} element(s) on the stack", self.stack.len());
        for token in self.stack.iter().rev() {
            log::debug!("\n{}", print_tree(token));
        }
    }
}
