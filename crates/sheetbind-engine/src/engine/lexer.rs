//! Tokenizer for expression text.
//!
//! Every token records the byte span it covers so the parser can attach spans to
//! reference nodes, which is what lets renames and structural edits rewrite a formula
//! without disturbing the rest of its text.

use super::error::{EngineError, EngineResult, Span};

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    /// `<<any label text>>`
    Label(String),
    /// `#REF!`, the rendering of a reference whose target was deleted.
    RefError,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LParen,
    RParen,
    Comma,
    Colon,
    Dot,
    Hash,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> EngineResult<Vec<Token>> {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.pos += ch.len_utf8();
                continue;
            }
            let start = self.pos;
            let kind = match ch {
                '0'..='9' => self.number()?,
                '"' => self.string()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.ident(),
                '<' if self.rest().starts_with("<<") => self.label()?,
                '#' if self.rest().starts_with("#REF!") && !self.follows_qualifier() => {
                    self.pos += "#REF!".len();
                    TokenKind::RefError
                }
                _ => self.operator()?,
            };
            self.tokens.push(Token {
                kind,
                span: start..self.pos,
            });
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: self.pos..self.pos,
        });
        Ok(self.tokens)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset..)?.chars().next()
    }

    fn follows_qualifier(&self) -> bool {
        matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Ident(_)) | Some(TokenKind::Label(_))
        )
    }

    fn number(&mut self) -> EngineResult<TokenKind> {
        let start = self.pos;
        self.eat_digits();
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += digit_at;
                self.eat_digits();
            }
        }
        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| EngineError::parse(format!("invalid number '{}'", text), start..self.pos))
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn string(&mut self) -> EngineResult<TokenKind> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
            match ch {
                '"' => return Ok(TokenKind::Str(out)),
                '\\' => {
                    let Some(next) = self.peek() else { break };
                    self.pos += next.len_utf8();
                    match next {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
        Err(EngineError::parse("unterminated string", start..self.pos))
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        TokenKind::Ident(self.src[start..self.pos].to_string())
    }

    fn label(&mut self) -> EngineResult<TokenKind> {
        let start = self.pos;
        let body = &self.src[start + 2..];
        let Some(end) = body.find(">>") else {
            return Err(EngineError::parse("unterminated <<label>>", start..self.src.len()));
        };
        let text = body[..end].to_string();
        self.pos = start + 2 + end + 2;
        if text.is_empty() {
            return Err(EngineError::parse("empty <<label>>", start..self.pos));
        }
        Ok(TokenKind::Label(text))
    }

    fn operator(&mut self) -> EngineResult<TokenKind> {
        let start = self.pos;
        let two = |a: char, b: char| self.peek() == Some(a) && self.peek_at(1) == Some(b);
        let (kind, width) = if two('<', '=') {
            (TokenKind::Le, 2)
        } else if two('>', '=') {
            (TokenKind::Ge, 2)
        } else if two('<', '>') {
            (TokenKind::Ne, 2)
        } else {
            let kind = match self.peek() {
                Some('+') => TokenKind::Plus,
                Some('-') => TokenKind::Minus,
                Some('*') => TokenKind::Star,
                Some('/') => TokenKind::Slash,
                Some('%') => TokenKind::Percent,
                Some('^') => TokenKind::Caret,
                Some('&') => TokenKind::Amp,
                Some('=') => TokenKind::Eq,
                Some('<') => TokenKind::Lt,
                Some('>') => TokenKind::Gt,
                Some('(') => TokenKind::LParen,
                Some(')') => TokenKind::RParen,
                Some(',') => TokenKind::Comma,
                Some(':') => TokenKind::Colon,
                Some('.') => TokenKind::Dot,
                Some('#') => TokenKind::Hash,
                Some(other) => {
                    return Err(EngineError::parse(
                        format!("unexpected character '{}'", other),
                        start..start + other.len_utf8(),
                    ));
                }
                None => TokenKind::Eof,
            };
            (kind, 1)
        };
        self.pos += width;
        Ok(kind)
    }
}

pub fn tokenize(src: &str) -> EngineResult<Vec<Token>> {
    Lexer::new(src).tokenize()
}
