use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Pos { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lexer error at line {line}, col {col}: {msg}")]
    Lexer { line: usize, col: usize, msg: String },

    #[error("parse error at line {line}, col {col}: {msg}")]
    Parse { line: usize, col: usize, msg: String },

    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("codegen error at line {line}, col {col}: {msg}")]
    Codegen { line: usize, col: usize, msg: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub(crate) fn lexer(pos: Pos, msg: impl Into<String>) -> Self {
        CompileError::Lexer { line: pos.line, col: pos.col, msg: msg.into() }
    }

    pub(crate) fn parse(pos: Pos, msg: impl Into<String>) -> Self {
        CompileError::Parse { line: pos.line, col: pos.col, msg: msg.into() }
    }

    pub(crate) fn codegen(pos: Pos, msg: impl Into<String>) -> Self {
        CompileError::Codegen { line: pos.line, col: pos.col, msg: msg.into() }
    }

    /// Source position of the error, if it has one.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            CompileError::Lexer { line, col, .. }
            | CompileError::Parse { line, col, .. }
            | CompileError::Codegen { line, col, .. } => Some(Pos::new(*line, *col)),
            CompileError::Semantic(e) => Some(e.pos()),
            CompileError::Config(_) | CompileError::Io(_) => None,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lexer { .. } | CompileError::Parse { .. } => 1,
            CompileError::Semantic(e) => e.kind().exit_code(),
            CompileError::Codegen { .. } => 7,
            CompileError::Config(_) | CompileError::Io(_) => 8,
        }
    }
}

/// Discriminant of a semantic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticErrorKind {
    UndeclaredVariable,
    RedeclaredVariable,
    TypeMismatch,
    BreakOutsideLoop,
    ContinueOutsideLoop,
}

impl SemanticErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            SemanticErrorKind::UndeclaredVariable => 2,
            SemanticErrorKind::RedeclaredVariable => 3,
            SemanticErrorKind::TypeMismatch => 4,
            SemanticErrorKind::BreakOutsideLoop => 5,
            SemanticErrorKind::ContinueOutsideLoop => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("undeclared variable '{name}' at {pos}")]
    UndeclaredVariable { name: String, pos: Pos },

    #[error("variable '{name}' already declared in this scope at {pos}")]
    RedeclaredVariable { name: String, pos: Pos },

    #[error("type mismatch at {pos}: {msg}")]
    TypeMismatch { msg: String, pos: Pos },

    #[error("'brk' outside loop at {pos}")]
    BreakOutsideLoop { pos: Pos },

    #[error("'con' outside loop at {pos}")]
    ContinueOutsideLoop { pos: Pos },
}

impl SemanticError {
    pub fn kind(&self) -> SemanticErrorKind {
        match self {
            SemanticError::UndeclaredVariable { .. } => SemanticErrorKind::UndeclaredVariable,
            SemanticError::RedeclaredVariable { .. } => SemanticErrorKind::RedeclaredVariable,
            SemanticError::TypeMismatch { .. } => SemanticErrorKind::TypeMismatch,
            SemanticError::BreakOutsideLoop { .. } => SemanticErrorKind::BreakOutsideLoop,
            SemanticError::ContinueOutsideLoop { .. } => SemanticErrorKind::ContinueOutsideLoop,
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            SemanticError::UndeclaredVariable { pos, .. }
            | SemanticError::RedeclaredVariable { pos, .. }
            | SemanticError::TypeMismatch { pos, .. }
            | SemanticError::BreakOutsideLoop { pos }
            | SemanticError::ContinueOutsideLoop { pos } => *pos,
        }
    }
}
