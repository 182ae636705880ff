//! Recursive descent parser from tokens to [`Expr`].
//!
//! GRAMMAR:
//!   expression     --> comparison
//!   comparison     --> concat ( ("=" | "<>" | "<" | ">" | "<=" | ">=") concat )*
//!   concat         --> additive ( "&" additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/" | "%") unary )*
//!   unary          --> ("-" | "+") unary | power
//!   power          --> primary ( "^" unary )?
//!   primary        --> NUMBER | STRING | TRUE | FALSE | "#REF!" | "(" expression ")"
//!                    | IDENT "(" arguments? ")" | reference
//!   reference      --> [ qualifier "#" ] [ qualifier "." ] member [ ":" ADDRESS ]
//!   qualifier      --> IDENT | "<<" label ">>"

use super::address::{CellAddress, CellRange, is_address_syntax};
use super::alias::is_keyword;
use super::ast::{BinaryOp, Expr, RefTarget, Reference, UnaryOp};
use super::error::{EngineError, EngineResult, Span};
use super::lexer::{Token, TokenKind, tokenize};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Parse expression text (without the leading `=`) into a tree.
pub fn parse_expr(source: &str) -> EngineResult<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };

    if parser.at(&TokenKind::Eof) {
        return Err(EngineError::parse("empty expression", 0..source.len()));
    }

    let expr = parser.expression()?;
    if !parser.at(&TokenKind::Eof) {
        let token = parser.current();
        return Err(EngineError::parse(
            format!("unexpected {}", describe(&token.kind)),
            token.span.clone(),
        ));
    }
    Ok(expr)
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::Str(_) => "string".to_string(),
        TokenKind::Ident(name) => format!("'{}'", name),
        TokenKind::Label(label) => format!("<<{}>>", label),
        TokenKind::Eof => "end of expression".to_string(),
        other => format!("{:?}", other),
    }
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> EngineResult<Token> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            let token = self.current();
            Err(EngineError::parse(
                format!("expected {}, found {}", what, describe(&token.kind)),
                token.span.clone(),
            ))
        }
    }

    fn expression(&mut self) -> EngineResult<Expr> {
        self.comparison()
    }

    fn comparison(&mut self) -> EngineResult<Expr> {
        let mut left = self.concat()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.concat()?;
            left = binary(op, left, right);
        }
    }

    fn concat(&mut self) -> EngineResult<Expr> {
        let mut left = self.additive()?;
        while self.at(&TokenKind::Amp) {
            self.advance();
            let right = self.additive()?;
            left = binary(BinaryOp::Concat, left, right);
        }
        Ok(left)
    }

    fn additive(&mut self) -> EngineResult<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn multiplicative(&mut self) -> EngineResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> EngineResult<Expr> {
        let op = match self.current().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.power(),
        };
        self.advance();
        let expr = self.unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn power(&mut self) -> EngineResult<Expr> {
        let base = self.primary()?;
        if self.at(&TokenKind::Caret) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> EngineResult<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            TokenKind::RefError => {
                self.advance();
                Ok(Expr::RefError)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Group(Box::new(inner)))
            }
            TokenKind::Label(_) => self.reference(),
            TokenKind::Ident(ref name) => match self.peek_kind(1).clone() {
                TokenKind::LParen => self.call(),
                TokenKind::Hash | TokenKind::Dot => self.reference(),
                _ if is_keyword(name) => {
                    self.advance();
                    Ok(Expr::Bool(name.eq_ignore_ascii_case("true")))
                }
                _ => self.reference(),
            },
            ref other => Err(EngineError::parse(
                format!("unexpected {}", describe(other)),
                token.span.clone(),
            )),
        }
    }

    fn call(&mut self) -> EngineResult<Expr> {
        let token = self.advance();
        let TokenKind::Ident(name) = token.kind else {
            return Err(EngineError::parse("expected a function name", token.span));
        };
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if self.at(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Call { name, args })
    }

    /// Consume an identifier or `<<label>>` usable as a qualifier.
    fn qualifier(&mut self) -> EngineResult<(String, Span, bool)> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.span, false)),
            TokenKind::Label(label) => Ok((label, token.span, true)),
            other => Err(EngineError::parse(
                format!("expected a name, found {}", describe(&other)),
                token.span,
            )),
        }
    }

    fn member(&mut self) -> EngineResult<(String, Span)> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.span)),
            other => Err(EngineError::parse(
                format!("expected a cell, alias or property name, found {}", describe(&other)),
                token.span,
            )),
        }
    }

    fn reference(&mut self) -> EngineResult<Expr> {
        let (first, first_span, first_is_label) = self.qualifier()?;
        let start = first_span.start;

        let mut document = None;
        let mut object = None;
        let (member, member_span) = if self.at(&TokenKind::Hash) {
            self.advance();
            document = Some(first);
            let (obj, _, _) = self.qualifier()?;
            self.expect(TokenKind::Dot, "'.' after object name")?;
            object = Some(obj);
            self.member()?
        } else if self.at(&TokenKind::Dot) {
            self.advance();
            object = Some(first);
            self.member()?
        } else if first_is_label {
            return Err(EngineError::parse(
                "a <<label>> must be followed by '.' or '#'",
                first_span,
            ));
        } else {
            (first, first_span)
        };

        let mut end = member_span.end;
        let target = if is_address_syntax(&member) {
            let addr = CellAddress::parse(&member)
                .map_err(|e| EngineError::parse(e.to_string(), member_span.clone()))?;
            if self.at(&TokenKind::Colon) {
                self.advance();
                let (last, last_span) = self.member()?;
                let last_addr = CellAddress::parse(&last)
                    .map_err(|e| EngineError::parse(e.to_string(), last_span.clone()))?;
                end = last_span.end;
                RefTarget::Range(CellRange::new(addr, last_addr))
            } else {
                RefTarget::Cell(addr)
            }
        } else {
            RefTarget::Name(member)
        };

        Ok(Expr::Reference(Reference {
            document,
            object,
            target,
            span: start..end,
        }))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
