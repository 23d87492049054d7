//! Grammar rules and the symbol sets derived from them.
//!
//! Grammar text has one production per line, `LHS = RHS1 RHS2 ... RHSn .`,
//! with symbols separated by whitespace. Empty lines are skipped. The start
//! symbol is the left hand side of the rule that ends with the accept symbol.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::GrammarError;
use crate::Symbol;

/// One production. The right hand side is stored reversed, so index 0 is the
/// symbol that sits on top of the stack when the rule is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule<S> {
    lhs: S,
    rhs: Vec<S>,
}

impl<S: Symbol> Rule<S> {
    /// Build a rule from its right hand side in source order. Returns `None`
    /// for an empty right hand side.
    pub fn new(lhs: S, mut rhs: Vec<S>) -> Option<Self> {
        if rhs.is_empty() {
            return None;
        }
        rhs.reverse();
        Some(Self { lhs, rhs })
    }

    pub fn lhs(&self) -> S {
        self.lhs
    }

    /// Right hand side in stack order (last source symbol first).
    pub fn rhs(&self) -> &[S] {
        &self.rhs
    }

    /// Symbol at a stack-order index.
    pub fn rhs_at(&self, index: usize) -> Option<S> {
        self.rhs.get(index).copied()
    }

    /// The leftmost symbol in source order.
    pub fn head(&self) -> S {
        self.rhs[self.rhs.len() - 1]
    }

    /// Right hand side in source order.
    pub fn symbols(&self) -> impl Iterator<Item = S> + '_ {
        self.rhs.iter().rev().copied()
    }

    /// Stack-order indices at which `symbol` occurs.
    pub fn indices_of(&self, symbol: S) -> Vec<usize> {
        self.rhs
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == symbol)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    /// Always false; rules are never empty.
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

impl<S: Symbol> fmt::Display for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} =", self.lhs)?;
        for symbol in self.symbols() {
            write!(f, " {symbol}")?;
        }
        write!(f, " .")
    }
}

/// A set of symbols plus a boundary marker. For lookaheads the boundary is
/// the end of input; for preceding symbols it is the bottom of the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSet<S> {
    symbols: BTreeSet<S>,
    boundary: bool,
}

impl<S: Symbol> SymbolSet<S> {
    pub fn new() -> Self {
        Self {
            symbols: BTreeSet::new(),
            boundary: false,
        }
    }

    pub fn insert(&mut self, symbol: S) -> bool {
        self.symbols.insert(symbol)
    }

    pub fn insert_boundary(&mut self) -> bool {
        !std::mem::replace(&mut self.boundary, true)
    }

    /// Add everything in `other`, reporting whether the set grew.
    pub fn extend(&mut self, other: &SymbolSet<S>) -> bool {
        let mut changed = false;
        for symbol in &other.symbols {
            changed |= self.symbols.insert(*symbol);
        }
        if other.boundary {
            changed |= self.insert_boundary();
        }
        changed
    }

    /// `None` stands for the boundary.
    pub fn contains(&self, symbol: Option<S>) -> bool {
        match symbol {
            Some(symbol) => self.symbols.contains(&symbol),
            None => self.boundary,
        }
    }

    pub fn has_boundary(&self) -> bool {
        self.boundary
    }

    pub fn iter(&self) -> impl Iterator<Item = S> + '_ {
        self.symbols.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && !self.boundary
    }

    /// Human readable listing, naming the boundary `boundary`.
    pub fn describe(&self, boundary: &str) -> String {
        let mut names: Vec<String> = self.symbols.iter().map(|s| s.to_string()).collect();
        if self.boundary {
            names.push(boundary.to_string());
        }

        match names.len() {
            0 => "nothing".to_string(),
            1 => names.remove(0),
            n => {
                let last = names.remove(n - 1);
                format!("{} or {last}", names.join(", "))
            }
        }
    }
}

impl<S: Symbol> Default for SymbolSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Symbol> FromIterator<S> for SymbolSet<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
            boundary: false,
        }
    }
}

/// A validated rule list with its FIRST, FOLLOW and PRECEDE sets.
#[derive(Debug, Clone)]
pub struct Grammar<S> {
    rules: Vec<Rule<S>>,
    start: S,
    first: BTreeMap<S, BTreeSet<S>>,
    follow: BTreeMap<S, SymbolSet<S>>,
    precede: BTreeMap<S, SymbolSet<S>>,
}

impl<S: Symbol> Grammar<S> {
    /// Parse grammar text. Line numbers in errors are 1-based.
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        let mut rules = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            rules.push(parse_rule(line, index + 1)?);
        }
        Self::from_rules(rules)
    }

    pub fn from_rules(rules: Vec<Rule<S>>) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let start = rules
            .iter()
            .find(|rule| rule.rhs[0].is_accept())
            .map(|rule| rule.lhs)
            .ok_or(GrammarError::NoAcceptRule)?;

        let defined: BTreeSet<S> = rules.iter().map(|rule| rule.lhs).collect();
        for rule in &rules {
            if let Some(missing) = rule.symbols().find(|s| !s.is_terminal() && !defined.contains(s)) {
                return Err(GrammarError::Undefined {
                    name: missing.to_string(),
                });
            }
        }
        check_unit_cycles(&rules)?;

        let first = first_sets(&rules);
        let follow = follow_sets(&rules, start, &first);
        let precede = precede_sets(&rules, start);

        log::debug!("grammar: {} rules, start symbol {start}", rules.len());

        Ok(Self {
            rules,
            start,
            first,
            follow,
            precede,
        })
    }

    pub fn rules(&self) -> &[Rule<S>] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule<S>> {
        self.rules.get(index)
    }

    pub fn start(&self) -> S {
        self.start
    }

    /// Every symbol used on some right hand side.
    pub fn symbols(&self) -> BTreeSet<S> {
        self.rules.iter().flat_map(|rule| rule.symbols()).collect()
    }

    /// Terminals that can begin `symbol`.
    pub fn first(&self, symbol: S) -> BTreeSet<S> {
        first_of(&self.first, symbol)
    }

    /// Terminals that can follow `symbol`; the boundary means end of input.
    pub fn follow(&self, symbol: S) -> SymbolSet<S> {
        self.follow.get(&symbol).cloned().unwrap_or_default()
    }

    /// Symbols that can sit directly below `symbol` on the stack when it
    /// starts a phrase; the boundary means the bottom of the stack.
    pub fn precede(&self, symbol: S) -> SymbolSet<S> {
        self.precede.get(&symbol).cloned().unwrap_or_default()
    }
}

fn parse_rule<S: Symbol>(text: &str, line: usize) -> Result<Rule<S>, GrammarError> {
    let body = text
        .strip_suffix('.')
        .ok_or(GrammarError::MissingTerminator { line })?;
    let fields: Vec<&str> = body.split_whitespace().collect();
    let equals = fields
        .iter()
        .position(|field| *field == "=")
        .ok_or(GrammarError::MissingEquals { line })?;
    let (left, right) = (&fields[..equals], &fields[equals + 1..]);

    let name = match left {
        [] => return Err(GrammarError::EmptyLhs { line }),
        [name] => *name,
        _ => {
            return Err(GrammarError::MultipleLhs {
                line,
                count: left.len(),
            })
        }
    };
    let lhs: S = symbol(name, line)?;
    if lhs.is_terminal() {
        return Err(GrammarError::TerminalLhs {
            line,
            name: name.to_string(),
        });
    }

    let rhs = right
        .iter()
        .map(|name| symbol(name, line))
        .collect::<Result<Vec<S>, _>>()?;
    Rule::new(lhs, rhs).ok_or(GrammarError::EmptyRhs { line })
}

fn symbol<S: Symbol>(name: &str, line: usize) -> Result<S, GrammarError> {
    S::from_name(name).ok_or_else(|| GrammarError::UnknownSymbol {
        line,
        name: name.to_string(),
    })
}

/// Reject `A = B`, `B = A` chains. Without them every reduction consumes
/// input or grows the tree, so the parse loop terminates.
fn check_unit_cycles<S: Symbol>(rules: &[Rule<S>]) -> Result<(), GrammarError> {
    let mut units: BTreeMap<S, Vec<S>> = BTreeMap::new();
    for rule in rules.iter().filter(|rule| rule.len() == 1 && !rule.rhs[0].is_terminal()) {
        units.entry(rule.lhs).or_default().push(rule.rhs[0]);
    }

    for &origin in units.keys() {
        let mut seen = BTreeSet::new();
        let mut pending = units[&origin].clone();
        while let Some(symbol) = pending.pop() {
            if symbol == origin {
                return Err(GrammarError::Cycle {
                    name: origin.to_string(),
                });
            }
            if seen.insert(symbol) {
                if let Some(next) = units.get(&symbol) {
                    pending.extend(next.iter().copied());
                }
            }
        }
    }
    Ok(())
}

fn first_of<S: Symbol>(first: &BTreeMap<S, BTreeSet<S>>, symbol: S) -> BTreeSet<S> {
    if symbol.is_terminal() {
        return BTreeSet::from([symbol]);
    }
    first.get(&symbol).cloned().unwrap_or_default()
}

fn first_sets<S: Symbol>(rules: &[Rule<S>]) -> BTreeMap<S, BTreeSet<S>> {
    let mut first: BTreeMap<S, BTreeSet<S>> = BTreeMap::new();
    loop {
        let mut changed = false;
        for rule in rules {
            let head = first_of(&first, rule.head());
            let entry = first.entry(rule.lhs).or_default();
            for symbol in head {
                changed |= entry.insert(symbol);
            }
        }
        if !changed {
            return first;
        }
    }
}

fn follow_sets<S: Symbol>(
    rules: &[Rule<S>],
    start: S,
    first: &BTreeMap<S, BTreeSet<S>>,
) -> BTreeMap<S, SymbolSet<S>> {
    let mut follow: BTreeMap<S, SymbolSet<S>> = BTreeMap::new();
    follow.entry(start).or_default().insert_boundary();

    loop {
        let mut changed = false;
        for rule in rules {
            let symbols: Vec<S> = rule.symbols().collect();
            for (i, &symbol) in symbols.iter().enumerate() {
                if symbol.is_terminal() {
                    continue;
                }
                let incoming: SymbolSet<S> = match symbols.get(i + 1) {
                    Some(&next) => first_of(first, next).into_iter().collect(),
                    None => follow.get(&rule.lhs).cloned().unwrap_or_default(),
                };
                changed |= follow.entry(symbol).or_default().extend(&incoming);
            }
        }
        if !changed {
            return follow;
        }
    }
}

/// LEFT(X): X itself plus every symbol that can appear leftmost in a
/// derivation of X.
fn left_sets<S: Symbol>(rules: &[Rule<S>]) -> BTreeMap<S, BTreeSet<S>> {
    let mut left: BTreeMap<S, BTreeSet<S>> = BTreeMap::new();
    for rule in rules {
        left.entry(rule.lhs).or_default().insert(rule.lhs);
        for symbol in rule.symbols() {
            left.entry(symbol).or_default().insert(symbol);
        }
    }

    loop {
        let mut changed = false;
        for rule in rules {
            let head = left.get(&rule.head()).cloned().unwrap_or_default();
            let entry = left.entry(rule.lhs).or_default();
            for symbol in head {
                changed |= entry.insert(symbol);
            }
        }
        if !changed {
            return left;
        }
    }
}

fn precede_sets<S: Symbol>(rules: &[Rule<S>], start: S) -> BTreeMap<S, SymbolSet<S>> {
    let left = left_sets(rules);
    let mut precede: BTreeMap<S, SymbolSet<S>> = BTreeMap::new();

    for &symbol in left.get(&start).into_iter().flatten() {
        precede.entry(symbol).or_default().insert_boundary();
    }
    for rule in rules {
        let symbols: Vec<S> = rule.symbols().collect();
        for pair in symbols.windows(2) {
            for &symbol in left.get(&pair[1]).into_iter().flatten() {
                precede.entry(symbol).or_default().insert(pair[0]);
            }
        }
    }

    loop {
        let mut changed = false;
        for rule in rules {
            let inherited = precede.get(&rule.lhs).cloned().unwrap_or_default();
            for &symbol in left.get(&rule.head()).into_iter().flatten() {
                changed |= precede.entry(symbol).or_default().extend(&inherited);
            }
        }
        if !changed {
            return precede;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::GRAMMAR;
    use brace_lexer::TokenKind::{self, *};
    use pretty_assertions::assert_eq;

    fn grammar() -> Grammar<TokenKind> {
        Grammar::parse(GRAMMAR).unwrap()
    }

    fn parse_err(text: &str) -> GrammarError {
        Grammar::<TokenKind>::parse(text).unwrap_err()
    }

    // =========================================================================
    // Rules
    // =========================================================================

    #[test]
    fn test_rule_is_stored_reversed() {
        let rule = Rule::new(Variable, vec![OpCurly, Dot, VariableName, ClCurly]).unwrap();
        assert_eq!(rule.rhs(), &[ClCurly, VariableName, Dot, OpCurly]);
        assert_eq!(rule.rhs_at(0), Some(ClCurly));
        assert_eq!(rule.rhs_at(4), None);
        assert_eq!(rule.head(), OpCurly);
        assert_eq!(rule.len(), 4);
    }

    #[test]
    fn test_rule_indices_of() {
        let rule = Rule::new(Sws, vec![Ws, Sws]).unwrap();
        assert_eq!(rule.indices_of(Ws), vec![1]);
        assert_eq!(rule.indices_of(Sws), vec![0]);
        assert!(rule.indices_of(Text).is_empty());
    }

    #[test]
    fn test_rule_display_is_source_order() {
        let rule = Rule::new(Source, vec![Source1, Eof]).unwrap();
        assert_eq!(rule.to_string(), "Source = Source (I) end of input .");
    }

    #[test]
    fn test_empty_rule_refused() {
        assert!(Rule::<TokenKind>::new(Elem, Vec::new()).is_none());
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_parse_template_grammar() {
        let g = grammar();
        assert_eq!(g.rules().len(), 10);
        assert_eq!(g.start(), Source);
        assert_eq!(g.rules()[0], Rule::new(Source, vec![Source1, Eof]).unwrap());
    }

    #[test]
    fn test_parse_skips_blank_lines_and_accepts_tight_terminator() {
        let g = Grammar::<TokenKind>::parse("\n  Source = Elem EOF.\n\nElem = text .\n").unwrap();
        assert_eq!(g.rules().len(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_err(""), GrammarError::Empty);
        assert_eq!(parse_err("Source = Elem EOF"), GrammarError::MissingTerminator { line: 1 });
        assert_eq!(parse_err("Source Elem EOF ."), GrammarError::MissingEquals { line: 1 });
        assert_eq!(parse_err("= Elem ."), GrammarError::EmptyLhs { line: 1 });
        assert_eq!(
            parse_err("Source Elem = EOF ."),
            GrammarError::MultipleLhs { line: 1, count: 2 }
        );
        assert_eq!(parse_err("\nSource = ."), GrammarError::EmptyRhs { line: 2 });
        assert_eq!(
            parse_err("Source = Foo EOF ."),
            GrammarError::UnknownSymbol {
                line: 1,
                name: "Foo".to_string()
            }
        );
        assert_eq!(
            parse_err("text = Elem ."),
            GrammarError::TerminalLhs {
                line: 1,
                name: "text".to_string()
            }
        );
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(parse_err("Elem = text ."), GrammarError::NoAcceptRule);
        assert_eq!(
            parse_err("Source = Elem EOF ."),
            GrammarError::Undefined {
                name: "Element".to_string()
            }
        );
        assert_eq!(
            parse_err("Source = Elem EOF .\nElem = Sws .\nSws = Elem .\nSws = ws ."),
            GrammarError::Cycle {
                name: "Element".to_string()
            }
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            GrammarError::MissingEquals { line: 3 }.to_string(),
            "Grammar error at line 3: missing '='"
        );
    }

    // =========================================================================
    // Sets
    // =========================================================================

    #[test]
    fn test_first_sets() {
        let g = grammar();
        assert_eq!(g.first(Variable), BTreeSet::from([OpCurly]));
        assert_eq!(g.first(Sws), BTreeSet::from([Ws]));
        assert_eq!(g.first(Elem), BTreeSet::from([Newline, Text, OpCurly, Ws]));
        assert_eq!(g.first(Text), BTreeSet::from([Text]));
    }

    #[test]
    fn test_follow_sets() {
        let g = grammar();
        assert!(g.follow(Source).contains(None));
        let eof: SymbolSet<TokenKind> = [Eof].into_iter().collect();
        assert_eq!(g.follow(Source1), eof);

        let elem = g.follow(Elem);
        for kind in [Newline, Text, OpCurly, Ws, Eof] {
            assert!(elem.contains(Some(kind)), "{kind:?}");
        }
        assert!(!elem.has_boundary());
        assert_eq!(g.follow(Sws), elem);
    }

    #[test]
    fn test_precede_sets() {
        let g = grammar();
        assert_eq!(g.precede(Source).describe("bottom"), "bottom");

        let source1 = g.precede(Source1);
        assert!(source1.contains(None));
        assert!(source1.contains(Some(Elem)));
        assert!(!source1.contains(Some(Source1)));

        let sws = g.precede(Sws);
        assert!(sws.contains(Some(Ws)));
        assert!(sws.contains(Some(Elem)));
        assert!(sws.contains(None));
        assert!(!g.precede(Elem).contains(Some(Ws)));
    }

    #[test]
    fn test_symbol_set_describe() {
        let mut set: SymbolSet<TokenKind> = [Dot, Text].into_iter().collect();
        assert_eq!(set.describe("end of input"), "dot or text");
        set.insert_boundary();
        assert_eq!(set.describe("end of input"), "dot, text or end of input");
        assert_eq!(SymbolSet::<TokenKind>::new().describe("x"), "nothing");
    }
}
