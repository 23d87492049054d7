use std::fmt;

use crate::error::DecisionError;
use crate::grammar::{Grammar, Rule, SymbolSet};
use crate::Symbol;

/// What the parser should do with the top of the stack. Reduce and accept
/// carry the index of the rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift,
    Reduce(usize),
    Accept(usize),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift => f.write_str("shift"),
            Action::Reduce(rule) => write!(f, "reduce by rule {rule}"),
            Action::Accept(rule) => write!(f, "accept by rule {rule}"),
        }
    }
}

/// One occurrence of a symbol inside a rule: "this symbol may be the one at
/// stack-order `position` of `rule`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item<S> {
    rule_index: usize,
    rule: Rule<S>,
    position: usize,
    action: Action,
    lookaheads: SymbolSet<S>,
    preceding: SymbolSet<S>,
}

impl<S: Symbol> Item<S> {
    /// `None` when `position` is outside the rule.
    pub fn new(rule_index: usize, rule: &Rule<S>, position: usize, grammar: &Grammar<S>) -> Option<Self> {
        let symbol = rule.rhs_at(position)?;

        let (action, lookaheads) = if position > 0 {
            let next = rule.rhs_at(position - 1)?;
            (Action::Shift, grammar.first(next).into_iter().collect())
        } else if symbol.is_accept() {
            (Action::Accept(rule_index), grammar.follow(rule.lhs()))
        } else {
            (Action::Reduce(rule_index), grammar.follow(rule.lhs()))
        };

        Some(Self {
            rule_index,
            rule: rule.clone(),
            position,
            action,
            lookaheads,
            preceding: grammar.precede(rule.lhs()),
        })
    }

    pub fn rule(&self) -> &Rule<S> {
        &self.rule
    }

    pub fn rule_index(&self) -> usize {
        self.rule_index
    }

    pub fn lhs(&self) -> S {
        self.rule.lhs()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn lookaheads(&self) -> &SymbolSet<S> {
        &self.lookaheads
    }

    /// Symbol expected `depth` elements below the top of the stack.
    pub fn rhs_relative(&self, depth: usize) -> Option<S> {
        self.rule.rhs_at(self.position + depth)
    }

    /// True once the symbol at `depth` is the leftmost of the rule.
    pub fn is_done(&self, depth: usize) -> bool {
        self.position + depth + 1 >= self.rule.len()
    }

    pub fn match_lookahead(&self, lookahead: Option<S>) -> Result<(), DecisionError<S>> {
        if self.lookaheads.contains(lookahead) {
            return Ok(());
        }
        Err(DecisionError::UnexpectedLookahead {
            symbol: self.rule.rhs()[self.position],
            expected: self.lookaheads.clone(),
            got: lookahead,
        })
    }

    /// Whether the rule may start directly above `below` (`None` is the
    /// bottom of the stack).
    pub fn accepts_preceding(&self, below: Option<S>) -> bool {
        self.preceding.contains(below)
    }
}

impl<S: Symbol> fmt::Display for Item<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let focus = self.rule.len() - 1 - self.position;
        write!(f, "{} =", self.rule.lhs())?;
        for (i, symbol) in self.rule.symbols().enumerate() {
            if i == focus {
                write!(f, " [{symbol}]")?;
            } else {
                write!(f, " {symbol}")?;
            }
        }
        write!(f, " . ({})", self.action)
    }
}
