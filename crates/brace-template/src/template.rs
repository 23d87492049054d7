use std::io;

use brace_lexer::Scanner;
use brace_parser::template::parse_tokens;
use brace_parser::{print_tree, ParseOptions, TrailingInput};

use crate::ast::{self, Node};
use crate::lookup::AttributeLookup;
use crate::{ApplyError, TemplateError, WriteError};

/// What `write` does with a placeholder that `apply` could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Write the placeholder back exactly as it appeared in the source.
    #[default]
    Preserve,
    /// Fail with [`WriteError::Unresolved`] before writing anything.
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOptions {
    pub parse: ParseOptions,
    pub unresolved: UnresolvedPolicy,
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn with_trailing_input(mut self, policy: TrailingInput) -> Self {
        self.parse.trailing_input = policy;
        self
    }

    pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }
}

/// A parsed template.
///
/// Rendering is two-phase: [`Template::apply`] replaces resolvable
/// placeholders with text, [`Template::write`] serializes what is left.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Node,
    options: TemplateOptions,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        Self::parse_with(source, TemplateOptions::default())
    }

    pub fn parse_with(source: &str, options: TemplateOptions) -> Result<Self, TemplateError> {
        let tokens = Scanner::tokenize(source)?;
        Self::from_tokens(tokens, options)
    }

    /// Parse UTF-8 bytes; invalid encoding is a lexer error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        Self::from_bytes_with(bytes, TemplateOptions::default())
    }

    pub fn from_bytes_with(bytes: &[u8], options: TemplateOptions) -> Result<Self, TemplateError> {
        let tokens = Scanner::tokenize_bytes(bytes)?;
        Self::from_tokens(tokens, options)
    }

    fn from_tokens(tokens: Vec<brace_lexer::Token>, options: TemplateOptions) -> Result<Self, TemplateError> {
        log::debug!("scanned {} token(s)", tokens.len());
        let tree = parse_tokens(tokens, &options.parse)?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("parse tree:\n{}", print_tree(&tree));
        }
        let root = ast::build(&tree)?;
        Ok(Self { root, options })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Top-level nodes in source order.
    pub fn nodes(&self) -> &[Node] {
        self.root.children()
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    pub fn set_unresolved_policy(&mut self, policy: UnresolvedPolicy) {
        self.options.unresolved = policy;
    }

    /// Names of placeholders not yet resolved, in source order.
    pub fn unresolved(&self) -> Vec<&str> {
        self.nodes()
            .iter()
            .filter_map(|node| match node {
                Node::Variable { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace every placeholder `data` can resolve with its text and return
    /// how many were replaced. Missing names are left for `write`. If any
    /// lookup fails nothing is replaced.
    pub fn apply<L: AttributeLookup + ?Sized>(&mut self, data: &L) -> Result<usize, ApplyError> {
        let mut values = Vec::new();
        for (index, node) in self.nodes().iter().enumerate() {
            if let Node::Variable { name, .. } = node {
                match data.lookup(name)? {
                    Some(value) => values.push((index, value.into_owned())),
                    None => log::trace!("no value for {name}"),
                }
            }
        }

        let resolved = values.len();
        if let Node::Source(nodes) = &mut self.root {
            for (index, value) in values {
                nodes[index] = Node::Text(value);
            }
        }
        log::debug!("resolved {resolved} placeholder(s)");
        Ok(resolved)
    }

    /// Like [`Template::apply`], but returns a resolved copy.
    pub fn resolved<L: AttributeLookup + ?Sized>(&self, data: &L) -> Result<Template, ApplyError> {
        let mut copy = self.clone();
        copy.apply(data)?;
        Ok(copy)
    }

    pub fn write<W: io::Write>(&self, mut sink: W) -> Result<(), WriteError> {
        if self.options.unresolved == UnresolvedPolicy::Error {
            if let Some(name) = self.unresolved().first() {
                return Err(WriteError::Unresolved {
                    name: name.to_string(),
                });
            }
        }

        let mut written = 0;
        for node in self.nodes() {
            let text = match node {
                Node::Text(text) => text,
                Node::Variable { marker, .. } => marker,
                Node::Source(_) => continue,
            };
            write_fully(&mut sink, text.as_bytes(), &mut written)?;
        }
        sink.flush()?;
        Ok(())
    }

    /// Apply `data`, then write.
    pub fn execute<W, L>(&mut self, sink: W, data: &L) -> Result<(), TemplateError>
    where
        W: io::Write,
        L: AttributeLookup + ?Sized,
    {
        self.apply(data)?;
        self.write(sink)?;
        Ok(())
    }

    /// Render with `data` into a string, leaving `self` untouched.
    pub fn render<L: AttributeLookup + ?Sized>(&self, data: &L) -> Result<String, TemplateError> {
        let mut out = Vec::new();
        self.resolved(data)?.write(&mut out)?;
        // Every node holds text taken from a `str` or returned by a lookup.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// `write_all`, but reporting how much got through when the sink gives up.
fn write_fully<W: io::Write>(sink: &mut W, mut bytes: &[u8], written: &mut usize) -> Result<(), WriteError> {
    while !bytes.is_empty() {
        match sink.write(bytes) {
            Ok(0) => return Err(WriteError::PartialWrite { written: *written }),
            Ok(n) => {
                bytes = &bytes[n..];
                *written += n;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(WriteError::Io(err)),
        }
    }
    Ok(())
}
