//! Template AST.
//!
//! The parse tree keeps every grammar wrapper; the AST keeps only what
//! rendering needs: a flat list of text runs and placeholders under one
//! `Source` root. Nodes own their children and carry no parent links.

use brace_lexer::{Token, TokenKind};
use brace_parser::TreeNode;

use crate::StructuralError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// The root; its children in source order.
    Source(Vec<Node>),

    /// A `{{ .Name }}` placeholder.
    Variable {
        name: String,
        /// The placeholder exactly as written, inner whitespace included.
        marker: String,
    },

    /// Literal text, a line break, or a whitespace run.
    Text(String),
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Source(children) => children,
            Node::Variable { .. } | Node::Text(_) => &[],
        }
    }
}

impl TreeNode for Node {
    fn is_leaf(&self) -> bool {
        !matches!(self, Node::Source(_))
    }

    fn children(&self) -> &[Self] {
        Node::children(self)
    }

    fn label(&self) -> String {
        match self {
            Node::Source(_) => "Source".to_string(),
            Node::Variable { name, .. } => format!("Variable ({name})"),
            Node::Text(text) => format!("Text ({text:?})"),
        }
    }
}

/// Lower a parse tree rooted at `Source` into an AST.
pub fn build(root: &Token) -> Result<Node, StructuralError> {
    let chain = match (root.kind, root.children()) {
        (TokenKind::Source, [chain, end]) if end.kind == TokenKind::Eof => chain,
        _ => return Err(unexpected(root, "Source ending in end of input")),
    };

    let mut nodes = Vec::new();
    let mut current = chain;
    loop {
        if current.kind != TokenKind::Source1 {
            return Err(unexpected(current, "Source (I)"));
        }
        match current.children() {
            [elem] => {
                nodes.push(element(elem)?);
                break;
            }
            [elem, rest] => {
                nodes.push(element(elem)?);
                current = rest;
            }
            _ => return Err(unexpected(current, "one or two children")),
        }
    }

    log::debug!("built AST with {} node(s)", nodes.len());
    Ok(Node::Source(nodes))
}

fn element(token: &Token) -> Result<Node, StructuralError> {
    let inner = match (token.kind, token.children()) {
        (TokenKind::Elem, [inner]) => inner,
        _ => return Err(unexpected(token, "Element")),
    };

    match inner.kind {
        TokenKind::Variable => variable(inner),
        TokenKind::Text | TokenKind::Newline => inner
            .text()
            .map(|text| Node::Text(text.to_string()))
            .ok_or_else(|| unexpected(inner, "a leaf")),
        TokenKind::Sws => Ok(Node::Text(inner.leaf_text())),
        _ => Err(unexpected(inner, "Variable, text, newline or whitespace")),
    }
}

fn variable(token: &Token) -> Result<Node, StructuralError> {
    let name = match token.children() {
        [_, _, name, _] if name.kind == TokenKind::VariableName => name,
        _ => return Err(unexpected(token, "four children with the name third")),
    };
    let name = name.text().ok_or_else(|| unexpected(name, "a leaf"))?;

    Ok(Node::Variable {
        name: name.to_string(),
        marker: token.leaf_text(),
    })
}

fn unexpected(token: &Token, expected: &'static str) -> StructuralError {
    StructuralError {
        node: token.kind,
        expected,
    }
}
