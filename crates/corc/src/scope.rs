//! Block-scoped symbol tables and the type inference rule shared by the
//! analyzer and the code generator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, ExprToken};
use crate::lexer::TokenKind;

/// The two value types of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VarType {
    #[default]
    Double,
    String,
}

/// The names declared directly inside one block, with their types.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    entries: HashMap<String, VarType>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<VarType> {
        self.entries.get(name).copied()
    }
}

/// Stack of scopes, innermost last. The global scope is created with the
/// stack and is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

/// Returned by `ScopeStack::declare` when the innermost scope already holds
/// the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyDeclared;

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { scopes: vec![Scope::default()] }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
        tracing::trace!(depth = self.scopes.len(), "push scope");
    }

    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        tracing::trace!(depth = self.scopes.len(), "pop scope");
    }

    /// Innermost-first lookup of a name's type.
    pub fn lookup(&self, name: &str) -> Option<VarType> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Declare `name` in the innermost scope. Shadowing an outer binding is
    /// allowed; a second declaration in the same scope is not.
    pub fn declare(&mut self, name: &str, ty: VarType) -> Result<(), AlreadyDeclared> {
        let innermost = self.scopes.len() - 1;
        let scope = &mut self.scopes[innermost];
        if scope.entries.contains_key(name) {
            return Err(AlreadyDeclared);
        }
        scope.entries.insert(name.to_string(), ty);
        Ok(())
    }

    /// A string literal, or an identifier bound to a String.
    pub fn is_string_operand(&self, tok: &ExprToken) -> bool {
        match tok.kind {
            TokenKind::Str => true,
            TokenKind::Ident => self.lookup(&tok.lexeme) == Some(VarType::String),
            _ => false,
        }
    }
}

/// Type of an expression, decided by its first token: a string literal is a
/// String, an identifier has its declared type (Double when unknown), and
/// everything else is a Double.
pub fn infer_type(expr: &Expr, scopes: &ScopeStack) -> VarType {
    match expr.first() {
        Some(tok) if tok.kind == TokenKind::Str => VarType::String,
        Some(tok) if tok.kind == TokenKind::Ident => scopes.lookup(&tok.lexeme).unwrap_or_default(),
        _ => VarType::Double,
    }
}
