//! Decision table: for each grammar symbol, every place it occurs in a rule.
//!
//! Deciding what to do with the top of the stack means finding the one item
//! whose rule is actually on the stack. Candidates are first filtered by
//! the lookahead, then probed one stack element at a time. A candidate that
//! reaches the leftmost symbol of its rule is checked against the element
//! below it and becomes a solution. Failed candidates leave ranked errors
//! behind; the deepest one is reported if nothing fits.

use std::collections::BTreeMap;

use brace_lexer::Token;

use crate::error::{DecisionError, GrammarError};
use crate::grammar::{Grammar, Rule};
use crate::item::{Action, Item};
use crate::rank::ErrorRank;
use crate::stack::Stack;
use crate::Symbol;

#[derive(Debug, Clone)]
pub struct DecisionTable<S> {
    grammar: Grammar<S>,
    items: BTreeMap<S, Vec<Item<S>>>,
}

impl<S: Symbol> DecisionTable<S> {
    /// Compile grammar text.
    pub fn new(text: &str) -> Result<Self, GrammarError> {
        Ok(Self::from_grammar(Grammar::parse(text)?))
    }

    pub fn from_grammar(grammar: Grammar<S>) -> Self {
        let mut items: BTreeMap<S, Vec<Item<S>>> = BTreeMap::new();
        for symbol in grammar.symbols() {
            let entry = items.entry(symbol).or_default();
            for (index, rule) in grammar.rules().iter().enumerate() {
                for position in rule.indices_of(symbol) {
                    entry.extend(Item::new(index, rule, position, &grammar));
                }
            }
        }

        let table = Self { grammar, items };
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("decision table:\n{}", table.dump());
        }
        table
    }

    pub fn grammar(&self) -> &Grammar<S> {
        &self.grammar
    }

    pub fn rule(&self, index: usize) -> Option<&Rule<S>> {
        self.grammar.rule(index)
    }

    /// Items for `symbol`, in rule order.
    pub fn items(&self, symbol: S) -> &[Item<S>] {
        self.items.get(&symbol).map(Vec::as_slice).unwrap_or_default()
    }

    /// One line per item, grouped by symbol.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (symbol, items) in &self.items {
            out.push_str(&format!("{symbol}:\n"));
            for item in items {
                out.push_str(&format!("    {item}\n"));
            }
        }
        out
    }

    /// Pick the action for the top of `stack`, given the kind of the next
    /// input token (`None` at end of input). The stack is left unchanged.
    pub fn decide(&self, stack: &mut Stack<Token<S>>, lookahead: Option<S>) -> Result<Action, DecisionError<S>> {
        let decision = self.probe(stack, lookahead);
        stack.rollback();
        decision
    }

    fn probe(&self, stack: &mut Stack<Token<S>>, lookahead: Option<S>) -> Result<Action, DecisionError<S>> {
        let top = stack.pop().map(|token| token.kind).ok_or(DecisionError::EmptyStack)?;
        let items = self.items(top);

        match items {
            [] => return Err(DecisionError::UnrecognizedSymbol(top)),
            [item] => {
                item.match_lookahead(lookahead)?;
                if item.is_done(0) {
                    let below = stack.peek().map(|token| token.kind);
                    if !item.accepts_preceding(below) {
                        return Err(DecisionError::UnexpectedPreceding {
                            lhs: item.lhs(),
                            got: below,
                        });
                    }
                }
                return Ok(item.action());
            }
            _ => {}
        }

        let mut errors = ErrorRank::new();
        let mut candidates: Vec<&Item<S>> = Vec::with_capacity(items.len());
        for item in items {
            match item.match_lookahead(lookahead) {
                Ok(()) => candidates.push(item),
                Err(err) => errors.add(err, 0),
            }
        }

        let mut solutions: Vec<&Item<S>> = Vec::new();
        let mut actual = Some(top);
        let mut depth = 0;

        while !candidates.is_empty() {
            if depth > 0 {
                actual = stack.pop().map(|token| token.kind);
            }
            let below = stack.peek().map(|token| token.kind);

            candidates.retain(|item| {
                let expected = match item.rhs_relative(depth) {
                    Some(expected) => expected,
                    None => return false,
                };
                if actual != Some(expected) {
                    errors.add(DecisionError::Mismatch { expected, got: actual }, depth);
                    return false;
                }
                if !item.is_done(depth) {
                    return true;
                }

                if item.accepts_preceding(below) {
                    solutions.push(*item);
                } else {
                    errors.add(
                        DecisionError::UnexpectedPreceding {
                            lhs: item.lhs(),
                            got: below,
                        },
                        depth + 1,
                    );
                }
                false
            });
            depth += 1;
        }

        let mut actions: Vec<Action> = Vec::new();
        for item in &solutions {
            if !actions.contains(&item.action()) {
                actions.push(item.action());
            }
        }

        match actions.as_slice() {
            [action] => Ok(*action),
            [] => Err(errors.into_best().unwrap_or(DecisionError::NoSolution(top))),
            _ => Err(DecisionError::Ambiguous {
                symbol: top,
                candidates: solutions.iter().map(|item| item.to_string()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::GRAMMAR;
    use brace_lexer::{Span, TokenKind::{self, *}};
    use pretty_assertions::assert_eq;

    fn table() -> DecisionTable<TokenKind> {
        DecisionTable::new(GRAMMAR).unwrap()
    }

    fn stack(kinds: &[TokenKind]) -> Stack<Token<TokenKind>> {
        let mut stack = Stack::new();
        for kind in kinds {
            let token = if kind.is_terminal() {
                Token::leaf(*kind, "", Span::default())
            } else {
                Token::node(*kind, vec![Token::leaf(Text, "", Span::default())]).unwrap()
            };
            stack.push(token);
        }
        stack
    }

    fn decide(kinds: &[TokenKind], lookahead: Option<TokenKind>) -> Result<Action, DecisionError<TokenKind>> {
        let mut stack = stack(kinds);
        let before = stack.len();
        let result = table().decide(&mut stack, lookahead);
        assert_eq!(stack.len(), before, "decide must leave the stack unchanged");
        assert_eq!(stack.pending(), 0);
        result
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_items_per_symbol() {
        let table = table();
        assert_eq!(table.items(OpCurly).len(), 1);
        assert_eq!(table.items(Elem).len(), 2);
        assert_eq!(table.items(Source1).len(), 2);
        assert_eq!(table.items(Ws).len(), 2);
        assert_eq!(table.items(Sws).len(), 2);
        assert!(table.items(Source).is_empty());
    }

    #[test]
    fn test_dump_lists_items() {
        let dump = table().dump();
        assert!(dump.contains("Variable = [open curly] dot variable name close curly . (shift)"));
        assert!(dump.contains("Source = Source (I) [end of input] . (accept by rule 0)"));
    }

    // =========================================================================
    // Decisions
    // =========================================================================

    #[test]
    fn test_single_item_shift() {
        assert_eq!(decide(&[OpCurly], Some(Dot)), Ok(Action::Shift));
        assert_eq!(decide(&[OpCurly, Dot, VariableName], Some(ClCurly)), Ok(Action::Shift));
    }

    #[test]
    fn test_single_item_reduce() {
        assert_eq!(
            decide(&[OpCurly, Dot, VariableName, ClCurly], Some(Ws)),
            Ok(Action::Reduce(7))
        );
        assert_eq!(decide(&[Text], Some(Eof)), Ok(Action::Reduce(4)));
    }

    #[test]
    fn test_single_item_checks_lookahead() {
        let err = decide(&[OpCurly, Dot, VariableName], Some(Eof)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "after variable name: expected close curly, got end of input instead"
        );
    }

    #[test]
    fn test_single_item_checks_preceding() {
        assert_eq!(decide(&[Elem, Text], Some(Eof)), Ok(Action::Reduce(4)));
        assert_eq!(
            decide(&[Dot, Text], Some(Eof)),
            Err(DecisionError::UnexpectedPreceding {
                lhs: Elem,
                got: Some(Dot),
            })
        );
        assert_eq!(
            decide(&[VariableName, OpCurly], Some(Dot)),
            Err(DecisionError::UnexpectedPreceding {
                lhs: Variable,
                got: Some(VariableName),
            })
        );
    }

    #[test]
    fn test_lookahead_separates_shift_from_reduce() {
        assert_eq!(decide(&[Elem], Some(Ws)), Ok(Action::Shift));
        assert_eq!(decide(&[Elem], Some(Eof)), Ok(Action::Reduce(1)));
        assert_eq!(decide(&[Elem, Elem], Some(Text)), Ok(Action::Shift));
    }

    #[test]
    fn test_depth_probe_prefers_longer_rule() {
        // Sws on top of Elem is a whole element, not the tail of `ws Sws`.
        assert_eq!(decide(&[Elem, Sws], Some(OpCurly)), Ok(Action::Reduce(6)));
        // Under a ws it is the tail.
        assert_eq!(decide(&[Ws, Sws], Some(Text)), Ok(Action::Reduce(9)));
    }

    #[test]
    fn test_preceding_check_picks_reduce_over_accept_shift() {
        assert_eq!(decide(&[Elem, Source1], Some(Eof)), Ok(Action::Reduce(2)));
        assert_eq!(decide(&[Source1], Some(Eof)), Ok(Action::Shift));
    }

    #[test]
    fn test_accept() {
        assert_eq!(decide(&[Source1, Eof], None), Ok(Action::Accept(0)));
    }

    #[test]
    fn test_empty_stack() {
        assert_eq!(decide(&[], None), Err(DecisionError::EmptyStack));
    }

    #[test]
    fn test_unrecognized_symbol() {
        assert_eq!(decide(&[Source], None), Err(DecisionError::UnrecognizedSymbol(Source)));
    }

    #[test]
    fn test_deepest_error_wins() {
        // The shift candidate fails on the lookahead; the reduce candidate
        // matches Elem and only fails on what sits below it.
        let err = decide(&[Dot, Elem], Some(Eof)).unwrap_err();
        assert_eq!(
            err,
            DecisionError::UnexpectedPreceding {
                lhs: Source1,
                got: Some(Dot)
            }
        );
        assert_eq!(err.to_string(), "Source (I) cannot start after dot");
    }

    #[test]
    fn test_rank_ties_report_first_candidate() {
        assert_eq!(
            decide(&[Dot, Source1], Some(Eof)),
            Err(DecisionError::UnexpectedPreceding {
                lhs: Source,
                got: Some(Dot)
            })
        );
    }

    #[test]
    fn test_ambiguous_grammar() {
        let table: DecisionTable<TokenKind> =
            DecisionTable::new("Source = Elem EOF .\nSource = Sws EOF .\nElem = text .\nSws = text .").unwrap();
        let mut stack = stack(&[Text]);
        let err = table.decide(&mut stack, Some(Eof)).unwrap_err();
        assert_eq!(
            err,
            DecisionError::Ambiguous {
                symbol: Text,
                candidates: vec![
                    "Element = [text] . (reduce by rule 2)".to_string(),
                    "Skippable whitespace = [text] . (reduce by rule 3)".to_string(),
                ],
            }
        );
        assert_eq!(stack.len(), 1);
    }
}
