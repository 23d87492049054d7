use std::fmt;

/// A position in source text, tracking line and column for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Smallest span covering both `self` and `other`, positioned at `self`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }
}

/// Token classification for brace templates.
///
/// The lexer only produces the terminal kinds. The nonterminal kinds label the
/// interior tokens built by the parser when it reduces a grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Terminals
    Eof,
    Dot,
    Newline,
    Text,
    OpCurly,
    ClCurly,
    VariableName,
    Ws,

    // Nonterminals
    Source,
    Source1,
    Elem,
    Variable,
    Sws,
}

impl TokenKind {
    /// Every kind, terminals first.
    pub const ALL: [TokenKind; 13] = [
        TokenKind::Eof,
        TokenKind::Dot,
        TokenKind::Newline,
        TokenKind::Text,
        TokenKind::OpCurly,
        TokenKind::ClCurly,
        TokenKind::VariableName,
        TokenKind::Ws,
        TokenKind::Source,
        TokenKind::Source1,
        TokenKind::Elem,
        TokenKind::Variable,
        TokenKind::Sws,
    ];

    /// Name used for this kind in grammar text.
    pub fn grammar_name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Dot => "dot",
            TokenKind::Newline => "newline",
            TokenKind::Text => "text",
            TokenKind::OpCurly => "op_curly",
            TokenKind::ClCurly => "cl_curly",
            TokenKind::VariableName => "variable_name",
            TokenKind::Ws => "ws",
            TokenKind::Source => "Source",
            TokenKind::Source1 => "Source1",
            TokenKind::Elem => "Elem",
            TokenKind::Variable => "Variable",
            TokenKind::Sws => "Sws",
        }
    }

    /// Look a kind up by its grammar name. New grammar symbols must be
    /// registered here and in [`TokenKind::grammar_name`].
    pub fn from_grammar_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.grammar_name() == name)
    }

    /// True for kinds produced directly by the lexer.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TokenKind::Eof
                | TokenKind::Dot
                | TokenKind::Newline
                | TokenKind::Text
                | TokenKind::OpCurly
                | TokenKind::ClCurly
                | TokenKind::VariableName
                | TokenKind::Ws
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Dot => "dot",
            TokenKind::Newline => "newline",
            TokenKind::Text => "text",
            TokenKind::OpCurly => "open curly",
            TokenKind::ClCurly => "close curly",
            TokenKind::VariableName => "variable name",
            TokenKind::Ws => "whitespace",
            TokenKind::Source => "Source",
            TokenKind::Source1 => "Source (I)",
            TokenKind::Elem => "Element",
            TokenKind::Variable => "Variable",
            TokenKind::Sws => "Skippable whitespace",
        };
        f.write_str(name)
    }
}

/// The next token of the original stream, by position and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookahead<K> {
    pub index: usize,
    pub kind: K,
}

/// Payload of a token: source text for leaves, an ordered child list for
/// tokens built by a reduction.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenData<K> {
    Leaf(String),
    Children(Vec<Token<K>>),
}

/// A token produced by the lexer, or an interior node of a parse tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<K = TokenKind> {
    pub kind: K,
    pub data: TokenData<K>,
    pub lookahead: Option<Lookahead<K>>,
    pub span: Span,
}

impl<K> Token<K> {
    /// A leaf token holding `text`.
    pub fn leaf(kind: K, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            data: TokenData::Leaf(text.into()),
            lookahead: None,
            span,
        }
    }

    /// An interior token over `children`, which must not be empty. The span
    /// covers all children and the lookahead is that of the rightmost child.
    pub fn node(kind: K, children: Vec<Token<K>>) -> Option<Self>
    where
        K: Copy,
    {
        let first = children.first()?.span;
        let last = children.last()?;
        let span = first.to(last.span);
        let lookahead = last.lookahead;

        Some(Self {
            kind,
            data: TokenData::Children(children),
            lookahead,
            span,
        })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.data, TokenData::Leaf(_))
    }

    /// Leaf text, or `None` for interior tokens.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            TokenData::Leaf(text) => Some(text),
            TokenData::Children(_) => None,
        }
    }

    /// Children of an interior token; empty for leaves.
    pub fn children(&self) -> &[Token<K>] {
        match &self.data {
            TokenData::Leaf(_) => &[],
            TokenData::Children(children) => children,
        }
    }

    /// Concatenated text of every leaf below this token, left to right.
    pub fn leaf_text(&self) -> String {
        let mut out = String::new();
        let mut pending = vec![self];

        while let Some(token) = pending.pop() {
            match &token.data {
                TokenData::Leaf(text) => out.push_str(text),
                TokenData::Children(children) => pending.extend(children.iter().rev()),
            }
        }

        out
    }
}

// Parse trees nest once per element, so the default drop glue would recurse
// as deep as the template is long. Children are detached onto a work list
// and each token is dropped with no children left.
impl<K> Drop for Token<K> {
    fn drop(&mut self) {
        let mut pending = match &mut self.data {
            TokenData::Children(children) if !children.is_empty() => std::mem::take(children),
            _ => return,
        };

        while let Some(mut token) = pending.pop() {
            if let TokenData::Children(children) = &mut token.data {
                pending.append(children);
            }
        }
    }
}

impl<K: fmt::Display> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            TokenData::Leaf(text) => write!(f, "{} ({text:?})", self.kind),
            TokenData::Children(_) => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(kind: TokenKind, text: &str, start: usize) -> Token {
        Token::leaf(kind, text, Span::new(start, start + text.len(), 1, start + 1))
    }

    #[test]
    fn test_grammar_names_round_trip() {
        for kind in TokenKind::ALL {
            assert_eq!(TokenKind::from_grammar_name(kind.grammar_name()), Some(kind));
        }
        assert_eq!(TokenKind::from_grammar_name("Nope"), None);
    }

    #[test]
    fn test_terminal_split() {
        let terminals: Vec<_> = TokenKind::ALL.into_iter().filter(|k| k.is_terminal()).collect();
        assert_eq!(terminals.len(), 8);
        assert!(!TokenKind::Source.is_terminal());
    }

    #[test]
    fn test_node_refuses_empty_children() {
        assert!(Token::node(TokenKind::Elem, Vec::new()).is_none());
    }

    #[test]
    fn test_node_takes_span_and_lookahead_from_children() {
        let mut a = leaf(TokenKind::Text, "ab", 0);
        let mut b = leaf(TokenKind::Ws, " ", 2);
        a.lookahead = Some(Lookahead { index: 1, kind: TokenKind::Ws });
        b.lookahead = Some(Lookahead { index: 2, kind: TokenKind::Eof });

        let node = Token::node(TokenKind::Source1, vec![a, b]).unwrap();
        assert_eq!(node.span.start, 0);
        assert_eq!(node.span.end, 3);
        assert_eq!(node.lookahead, Some(Lookahead { index: 2, kind: TokenKind::Eof }));
        assert!(!node.is_leaf());
        assert_eq!(node.text(), None);
    }

    #[test]
    fn test_leaf_text_is_in_source_order() {
        let inner = Token::node(
            TokenKind::Elem,
            vec![leaf(TokenKind::Text, "b", 1), leaf(TokenKind::Ws, " ", 2)],
        )
        .unwrap();
        let outer = Token::node(TokenKind::Source1, vec![leaf(TokenKind::Text, "a", 0), inner]).unwrap();
        assert_eq!(outer.leaf_text(), "ab ");
    }

    #[test]
    fn test_deep_tree_drops_without_recursion() {
        let mut tree = leaf(TokenKind::Text, "x", 0);
        for _ in 0..200_000 {
            tree = Token::node(TokenKind::Source1, vec![leaf(TokenKind::Text, "a", 0), tree]).unwrap();
        }
        assert_eq!(tree.children().len(), 2);
        drop(tree);
    }

    #[test]
    fn test_clone_of_shallow_tree_survives_drop() {
        let node = Token::node(TokenKind::Elem, vec![leaf(TokenKind::Text, "x", 0)]).unwrap();
        let copy = node.clone();
        drop(node);
        assert_eq!(copy.leaf_text(), "x");
    }

    #[test]
    fn test_display() {
        assert_eq!(leaf(TokenKind::Text, "x", 0).to_string(), "text (\"x\")");
        let node = Token::node(TokenKind::Elem, vec![leaf(TokenKind::Text, "x", 0)]).unwrap();
        assert_eq!(node.to_string(), "Element");
    }
}
