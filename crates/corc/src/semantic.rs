use crate::ast::*;
use crate::error::{Pos, SemanticError};
use crate::lexer::TokenKind;
use crate::scope::{infer_type, ScopeStack, VarType};

/// Semantic pass: name resolution over nested block scopes, loop-control
/// legality, and the String/Double split. Stops at the first error.
pub fn analyze(program: &Program) -> Result<(), SemanticError> {
    let mut analyzer = Analyzer::new();
    let result = analyzer.analyze_stmts(&program.stmts);
    match &result {
        Ok(()) => tracing::debug!("semantic analysis passed"),
        Err(e) => tracing::debug!(error = %e, "semantic analysis failed"),
    }
    result
}

struct Analyzer {
    scopes: ScopeStack,
    loop_depth: usize,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer { scopes: ScopeStack::new(), loop_depth: 0 }
    }

    fn analyze_stmts(&mut self, stmts: &[Stmt]) -> Result<(), SemanticError> {
        for stmt in stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    /// Analyze `block` in a fresh scope, popping it on both exit paths.
    fn analyze_block(&mut self, block: &Block) -> Result<(), SemanticError> {
        self.scopes.push();
        let result = self.analyze_stmts(&block.stmts);
        self.scopes.pop();
        result
    }

    fn analyze_loop_body(&mut self, body: &Block) -> Result<(), SemanticError> {
        self.loop_depth += 1;
        let result = self.analyze_block(body);
        self.loop_depth -= 1;
        result
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let ty = match value {
                    Some(expr) => {
                        self.check_names(expr)?;
                        if expr.len() > 1 {
                            self.check_numeric(&expr.tokens, "an arithmetic expression")?;
                        }
                        infer_type(expr, &self.scopes)
                    }
                    None => VarType::Double,
                };
                self.scopes.declare(name, ty).map_err(|_| SemanticError::RedeclaredVariable {
                    name: name.clone(),
                    pos: stmt.pos,
                })?;
            }
            StmtKind::Return(value) => {
                if let Some(expr) = value {
                    self.check_names(expr)?;
                    if expr.len() > 1 {
                        self.check_numeric(&expr.tokens, "an arithmetic expression")?;
                    }
                }
            }
            StmtKind::If { condition, then_block, else_block } => {
                self.check_names(condition)?;
                self.check_numeric(&condition.tokens, "an 'if' condition")?;
                self.analyze_block(then_block)?;
                if let Some(block) = else_block {
                    self.analyze_block(block)?;
                }
            }
            StmtKind::While { condition, body } => {
                self.check_names(condition)?;
                self.check_numeric(&condition.tokens, "a 'while' condition")?;
                self.analyze_loop_body(body)?;
            }
            StmtKind::For { start, end, body } => {
                self.check_names(start)?;
                self.check_names(end)?;
                self.check_numeric(&start.tokens, "a 'for' bound")?;
                self.check_numeric(&end.tokens, "a 'for' bound")?;
                self.analyze_loop_body(body)?;
            }
            StmtKind::Out(expr) => {
                self.check_names(expr)?;
                if expr.len() > 1 {
                    self.check_numeric(&expr.tokens, "an arithmetic expression")?;
                }
            }
            StmtKind::In { name } => {
                if self.scopes.lookup(name).is_none() {
                    return Err(SemanticError::UndeclaredVariable { name: name.clone(), pos: stmt.pos });
                }
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::BreakOutsideLoop { pos: stmt.pos });
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(SemanticError::ContinueOutsideLoop { pos: stmt.pos });
                }
            }
            StmtKind::Expr(expr) => {
                self.check_names(expr)?;
                self.check_expr_stmt(expr, stmt.pos)?;
            }
        }
        Ok(())
    }

    /// Every identifier in `expr` must resolve in some enclosing scope.
    fn check_names(&self, expr: &Expr) -> Result<(), SemanticError> {
        for tok in expr.idents() {
            if self.scopes.lookup(&tok.lexeme).is_none() {
                return Err(SemanticError::UndeclaredVariable {
                    name: tok.lexeme.clone(),
                    pos: tok.pos,
                });
            }
        }
        Ok(())
    }

    /// Strings only appear as whole values; reject one used in `context`.
    fn check_numeric(&self, tokens: &[ExprToken], context: &str) -> Result<(), SemanticError> {
        match tokens.iter().find(|t| self.scopes.is_string_operand(t)) {
            Some(tok) => Err(SemanticError::TypeMismatch {
                msg: format!("string value '{}' used in {context}", tok.lexeme),
                pos: tok.pos,
            }),
            None => Ok(()),
        }
    }

    /// `x = value` must keep the type of `x`; any other multi-token
    /// expression statement is arithmetic.
    fn check_expr_stmt(&self, expr: &Expr, pos: Pos) -> Result<(), SemanticError> {
        let (target, value) = match expr.tokens.as_slice() {
            [target, assign, value @ ..]
                if target.kind == TokenKind::Ident && assign.kind == TokenKind::Assign =>
            {
                (target, value)
            }
            [_] => return Ok(()),
            _ => return self.check_numeric(&expr.tokens, "an arithmetic expression"),
        };

        match self.scopes.lookup(&target.lexeme) {
            Some(VarType::String) => match value {
                [single] if self.scopes.is_string_operand(single) => Ok(()),
                _ => Err(SemanticError::TypeMismatch {
                    msg: format!("string variable '{}' can only be assigned a single string value", target.lexeme),
                    pos: value.first().map(|t| t.pos).unwrap_or(pos),
                }),
            },
            _ => self.check_numeric(value, &format!("assignment to number variable '{}'", target.lexeme)),
        }
    }
}
