//! Box-drawing rendering of trees.

use std::fmt;

use brace_lexer::Token;

/// A node that can be rendered by [`print_tree`].
pub trait TreeNode: Sized {
    fn is_leaf(&self) -> bool;

    /// Children in display order; empty for leaves.
    fn children(&self) -> &[Self];

    /// One-line description of this node.
    fn label(&self) -> String;
}

struct Frame<'a, T> {
    prefix: String,
    node: &'a T,
    is_last: bool,
    is_root: bool,
}

/// Render `root` one node per line:
///
/// ```text
/// Source
/// ├── Source (I)
/// │   └── Element
/// │       └── text ("hi")
/// └── end of input ("")
/// ```
///
/// Walks with an explicit stack, so deep trees cannot overflow.
pub fn print_tree<T: TreeNode>(root: &T) -> String {
    let mut lines = Vec::new();
    let mut stack = vec![Frame {
        prefix: String::new(),
        node: root,
        is_last: true,
        is_root: true,
    }];

    while let Some(frame) = stack.pop() {
        let (branch, continuation) = match (frame.is_root, frame.is_last) {
            (true, _) => ("", ""),
            (false, true) => ("└── ", "    "),
            (false, false) => ("├── ", "│   "),
        };
        lines.push(format!("{}{branch}{}", frame.prefix, frame.node.label()));

        if frame.node.is_leaf() {
            continue;
        }
        let children = frame.node.children();
        let prefix = format!("{}{continuation}", frame.prefix);
        for (i, child) in children.iter().enumerate().rev() {
            stack.push(Frame {
                prefix: prefix.clone(),
                node: child,
                is_last: i + 1 == children.len(),
                is_root: false,
            });
        }
    }

    lines.join("\n")
}

impl<K: fmt::Display> TreeNode for Token<K> {
    fn is_leaf(&self) -> bool {
        Token::is_leaf(self)
    }

    fn children(&self) -> &[Self] {
        Token::children(self)
    }

    fn label(&self) -> String {
        self.to_string()
    }
}
