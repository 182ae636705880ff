//! Expression syntax tree.
//!
//! Reference nodes never hold resolved targets. They keep the qualifiers exactly as they
//! are rendered (document name or label, object label) and the byte span they occupy in
//! the source, so a rename or a structural edit can re-render just those nodes.

use std::fmt;

use super::address::{CellAddress, CellRange};
use super::alias::is_identifier;
use super::error::{EngineResult, Span};
use super::parser::parse_expr;
use super::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Concat => "&",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        }
    }
}

/// What a reference names inside its (possibly implicit) object.
#[derive(Clone, Debug, PartialEq)]
pub enum RefTarget {
    Cell(CellAddress),
    Range(CellRange),
    /// An alias when the object is a sheet, a property name otherwise.
    Name(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    /// Document qualifier as written before `#`.
    pub document: Option<String>,
    /// Object qualifier as written before `.`.
    pub object: Option<String>,
    pub target: RefTarget,
    /// Byte span of the whole reference in the expression source.
    pub span: Span,
}

impl Reference {
    pub fn local(target: RefTarget) -> Self {
        Reference {
            document: None,
            object: None,
            target,
            span: 0..0,
        }
    }

    pub fn is_local(&self) -> bool {
        self.document.is_none() && self.object.is_none()
    }
}

/// Render a document or object qualifier, quoting it when it is not a plain identifier.
pub fn render_qualifier(text: &str) -> String {
    if is_identifier(text) {
        text.to_string()
    } else {
        format!("<<{}>>", text)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(document) = &self.document {
            write!(f, "{}#", render_qualifier(document))?;
        }
        if let Some(object) = &self.object {
            write!(f, "{}.", render_qualifier(object))?;
        }
        match &self.target {
            RefTarget::Cell(addr) => write!(f, "{}", addr),
            RefTarget::Range(range) => write!(f, "{}", range),
            RefTarget::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    /// A reference invalidated by a structural edit (`#REF!`).
    RefError,
    Reference(Reference),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Group(Box<Expr>),
}

impl Expr {
    /// Visit every reference node in source order.
    pub fn visit_references<'a>(&'a self, f: &mut impl FnMut(&'a Reference)) {
        match self {
            Expr::Reference(r) => f(r),
            Expr::Unary { expr, .. } | Expr::Group(expr) => expr.visit_references(&mut *f),
            Expr::Binary { left, right, .. } => {
                left.visit_references(&mut *f);
                right.visit_references(&mut *f);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.visit_references(&mut *f);
                }
            }
            Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) | Expr::RefError => {}
        }
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Canonical rendering of the tree (normalized spacing).
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", Value::Number(*n)),
            Expr::Text(s) => write!(f, "{}", escape_text(s)),
            Expr::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Expr::RefError => write!(f, "#REF!"),
            Expr::Reference(r) => write!(f, "{}", r),
            Expr::Unary { op, expr } => match op {
                UnaryOp::Neg => write!(f, "-{}", expr),
                UnaryOp::Plus => write!(f, "+{}", expr),
            },
            Expr::Binary { op, left, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Group(expr) => write!(f, "({})", expr),
        }
    }
}

/// Outcome of rewriting one reference node.
#[derive(Clone, Debug, PartialEq)]
pub enum Rewrite {
    Keep,
    Replace(Reference),
    /// The target no longer exists; render as `#REF!`.
    Invalidate,
}

/// Source text paired with its parsed tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse expression text. A single leading `=` is accepted and dropped.
    pub fn parse(text: &str) -> EngineResult<Expression> {
        let source = text.strip_prefix('=').unwrap_or(text);
        let ast = parse_expr(source)?;
        Ok(Expression {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Reference nodes in source order.
    pub fn references(&self) -> Vec<&Reference> {
        let mut refs = Vec::new();
        self.ast.visit_references(&mut |r| refs.push(r));
        refs
    }

    /// Apply `f` to every reference and regenerate the text.
    ///
    /// Only the spans of changed references are re-rendered; all other text is kept
    /// byte-for-byte. Returns `None` when nothing changed.
    pub fn rewrite(
        &self,
        mut f: impl FnMut(&Reference) -> Rewrite,
    ) -> EngineResult<Option<Expression>> {
        let mut edits: Vec<(Span, String)> = Vec::new();
        for reference in self.references() {
            match f(reference) {
                Rewrite::Keep => {}
                Rewrite::Replace(new_ref) => {
                    let rendered = new_ref.to_string();
                    if rendered != self.source[reference.span.clone()] {
                        edits.push((reference.span.clone(), rendered));
                    }
                }
                Rewrite::Invalidate => edits.push((reference.span.clone(), "#REF!".to_string())),
            }
        }
        if edits.is_empty() {
            return Ok(None);
        }

        let mut text = self.source.clone();
        edits.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));
        for (span, rendered) in edits {
            text.replace_range(span, &rendered);
        }
        Expression::parse(&text).map(Some)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
