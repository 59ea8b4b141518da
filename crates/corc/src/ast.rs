use serde::{Deserialize, Serialize};

use crate::error::Pos;
use crate::lexer::TokenKind;

/// A complete program: the top-level statement list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// One token of a flat expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprToken {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Pos,
}

impl ExprToken {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, pos: Pos) -> Self {
        ExprToken { kind, lexeme: lexeme.into(), pos }
    }
}

/// An expression as an ordered token run. No precedence structure is built;
/// the target compiler decides how operators bind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expr {
    pub tokens: Vec<ExprToken>,
}

impl Expr {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn first(&self) -> Option<&ExprToken> {
        self.tokens.first()
    }

    /// The only token, when the expression is a single token.
    pub fn single(&self) -> Option<&ExprToken> {
        match self.tokens.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Identifier tokens in source order.
    pub fn idents(&self) -> impl Iterator<Item = &ExprToken> {
        self.tokens.iter().filter(|t| t.kind == TokenKind::Ident)
    }

    /// Position of the first token, or `fallback` for an empty expression.
    pub fn pos_or(&self, fallback: Pos) -> Pos {
        self.first().map(|t| t.pos).unwrap_or(fallback)
    }
}

/// A block of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// A statement and the position of its leading token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Pos) -> Self {
        Stmt { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Let {
        name: String,
        value: Option<Expr>,
    },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    /// Inclusive counting loop `for start : end { ... }`.
    For {
        start: Expr,
        end: Expr,
        body: Block,
    },
    Out(Expr),
    In {
        name: String,
    },
    Break,
    Continue,
    Expr(Expr),
}
