use crate::token::{Lookahead, Span, Token, TokenKind};
use crate::LexError;

/// Scanner mode determines how braces and letters are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Literal template text. Only `{{` is significant.
    Text,
    /// Inside `{{ ... }}`: dots, variable names and `}}`.
    Placeholder,
}

/// Where a token started.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
}

/// Template source scanner.
///
/// Works over a `Vec<char>` with index-based navigation and tracks
/// line/column on every token. Braces mean different things per mode.
///
/// Whitespace inside a placeholder is trivia: the run right after `{{` is
/// kept in the open token and the run right before `}}` in the close token,
/// so concatenating leaf text always gives back the placeholder as written.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    mode: ScannerMode,
}

impl Scanner {
    /// Create a new scanner for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            mode: ScannerMode::Text,
        }
    }

    /// Tokenize the entire source. The last token is always `Eof` and every
    /// other token's lookahead names its successor.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.finish())
    }

    /// Tokenize raw bytes, rejecting invalid UTF-8.
    pub fn tokenize_bytes(bytes: &[u8]) -> Result<Vec<Token>, LexError> {
        let source = std::str::from_utf8(bytes).map_err(|e| {
            // Count leading bytes of the valid prefix to get a character index.
            let chars = bytes[..e.valid_up_to()]
                .iter()
                .filter(|b| (**b & 0xC0) != 0x80)
                .count();
            LexError::InvalidEncoding { index: chars + 1 }
        })?;

        Self::tokenize(source)
    }

    /// Scan all tokens from the source.
    fn scan_tokens(&mut self) -> Result<(), LexError> {
        while !self.is_at_end() {
            match self.mode {
                ScannerMode::Text => self.scan_text_mode()?,
                ScannerMode::Placeholder => self.scan_placeholder_mode()?,
            }
        }

        Ok(())
    }

    fn scan_text_mode(&mut self) -> Result<(), LexError> {
        match self.peek() {
            '{' if self.peek_next() == '{' => {
                self.scan_open();
                Ok(())
            }
            '\n' | '\r' => self.scan_newline(),
            ' ' | '\t' => {
                self.scan_whitespace();
                Ok(())
            }
            _ => {
                self.scan_text();
                Ok(())
            }
        }
    }

    fn scan_placeholder_mode(&mut self) -> Result<(), LexError> {
        let ch = self.peek();

        match ch {
            ' ' | '\t' => {
                if self.whitespace_then_close() {
                    self.scan_close();
                } else {
                    self.skip_whitespace();
                }
                Ok(())
            }
            '}' if self.peek_next() == '}' => {
                self.scan_close();
                Ok(())
            }
            '{' if self.peek_next() == '{' => {
                self.scan_open();
                Ok(())
            }
            '.' => self.scan_dot(),
            '\n' | '\r' => self.scan_newline(),
            // A lone brace is literal text, even here; the parser rejects it.
            '{' | '}' => {
                let mark = self.mark();
                self.advance();
                self.push(TokenKind::Text, mark);
                Ok(())
            }
            c if c.is_uppercase() => {
                self.scan_variable_name();
                Ok(())
            }
            c => Err(self.unexpected(c)),
        }
    }

    // --- Scanners ---

    /// `{{` plus any whitespace right after it.
    fn scan_open(&mut self) {
        let mark = self.mark();
        self.advance();
        self.advance();
        while matches!(self.peek(), ' ' | '\t') && !self.is_at_end() {
            self.advance();
        }
        self.push(TokenKind::OpCurly, mark);
        self.mode = ScannerMode::Placeholder;
    }

    /// Optional whitespace followed by `}}`.
    fn scan_close(&mut self) {
        let mark = self.mark();
        while matches!(self.peek(), ' ' | '\t') && !self.is_at_end() {
            self.advance();
        }
        self.advance();
        self.advance();
        self.push(TokenKind::ClCurly, mark);
        self.mode = ScannerMode::Text;
    }

    /// `\n` or `\r\n`, always emitted as `"\n"`.
    fn scan_newline(&mut self) -> Result<(), LexError> {
        let mark = self.mark();

        if self.peek() == '\r' {
            if self.peek_next() != '\n' {
                return Err(LexError::MalformedEscape {
                    line: self.line,
                    column: self.column,
                });
            }
            self.advance();
        }
        self.advance();

        self.push_with_text(TokenKind::Newline, "\n".to_string(), mark);
        self.line += 1;
        self.column = 1;
        Ok(())
    }

    fn scan_whitespace(&mut self) {
        let mark = self.mark();
        self.skip_whitespace();
        self.push(TokenKind::Ws, mark);
    }

    /// Literal text up to whitespace, a line break or `{{`.
    fn scan_text(&mut self) {
        let mark = self.mark();

        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' | '\n' | '\r' => break,
                '{' if self.peek_next() == '{' => break,
                _ => self.advance(),
            }
        }

        self.push(TokenKind::Text, mark);
    }

    /// A dot must be directly followed by the variable name.
    fn scan_dot(&mut self) -> Result<(), LexError> {
        let mark = self.mark();
        self.advance();
        self.push(TokenKind::Dot, mark);

        if self.is_at_end() {
            return Err(LexError::UnexpectedEnd {
                line: self.line,
                column: self.column,
            });
        }

        let next = self.peek();
        if !next.is_uppercase() {
            return Err(self.unexpected(next));
        }

        Ok(())
    }

    /// variable_name = word { word } .
    /// word = "A".."Z" { "a".."z" } .
    fn scan_variable_name(&mut self) {
        let mark = self.mark();

        while !self.is_at_end() && self.peek().is_uppercase() {
            self.advance();
            while !self.is_at_end() && self.peek().is_lowercase() {
                self.advance();
            }
        }

        self.push(TokenKind::VariableName, mark);
    }

    // --- Helpers ---

    fn whitespace_then_close(&self) -> bool {
        let mut at = self.pos;
        while at < self.chars.len() && matches!(self.chars[at], ' ' | '\t') {
            at += 1;
        }
        self.chars.get(at) == Some(&'}') && self.chars.get(at + 1) == Some(&'}')
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && matches!(self.peek(), ' ' | '\t') {
            self.advance();
        }
    }

    fn finish(mut self) -> Vec<Token> {
        let end = Span::new(self.offset, self.offset, self.line, self.column);
        self.tokens.push(Token::leaf(TokenKind::Eof, "", end));

        let successors: Vec<TokenKind> = self.tokens.iter().skip(1).map(|t| t.kind).collect();
        for (index, (token, kind)) in self.tokens.iter_mut().zip(successors).enumerate() {
            token.lookahead = Some(Lookahead {
                index: index + 1,
                kind,
            });
        }

        log::debug!("lexed {} tokens", self.tokens.len());
        self.tokens
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn push(&mut self, kind: TokenKind, mark: Mark) {
        let text: String = self.chars[mark.pos..self.pos].iter().collect();
        self.push_with_text(kind, text, mark);
    }

    fn push_with_text(&mut self, kind: TokenKind, text: String, mark: Mark) {
        let span = Span::new(mark.offset, self.offset, mark.line, mark.column);
        log::trace!("token {kind:?} {text:?} at {}:{}", mark.line, mark.column);
        self.tokens.push(Token::leaf(kind, text, span));
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.pos]
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.pos + 1]
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.offset += self.chars[self.pos].len_utf8();
            self.pos += 1;
            self.column += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn unexpected(&self, ch: char) -> LexError {
        LexError::UnexpectedCharacter {
            ch,
            line: self.line,
            column: self.column,
        }
    }
}
