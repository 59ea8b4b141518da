use std::io::Write;

use crate::ast::*;
use crate::config::CompilerConfig;
use crate::error::{CompileError, Pos};
use crate::expr::{token_text, translate};
use crate::lexer::TokenKind;
use crate::scope::{infer_type, ScopeStack, VarType};

const PRELUDE: &str = "\
#include <stdio.h>
#include <stdlib.h>
#include <string.h>
#include <math.h>

int main(void) {
";

/// Generate C source for `program`. Variable types are re-derived here, so
/// the program does not need to have been analyzed first.
pub fn generate(program: &Program, config: &CompilerConfig) -> Result<String, CompileError> {
    let mut emitter = Emitter::new(config);
    emitter.emit_program(program)?;
    tracing::debug!(bytes = emitter.out.len(), "generated C source");
    Ok(emitter.out)
}

/// Generate C source and write it to `writer`. Nothing is written unless
/// generation succeeds; the writer is flushed once at the end.
pub fn emit_to<W: Write>(
    program: &Program,
    config: &CompilerConfig,
    writer: &mut W,
) -> Result<(), CompileError> {
    let source = generate(program, config)?;
    writer.write_all(source.as_bytes())?;
    writer.flush()?;
    Ok(())
}

struct Emitter {
    out: String,
    indent: usize,
    indent_width: usize,
    max_string_len: usize,
    buffer_size: usize,
    scopes: ScopeStack,
    next_temp: usize,
    next_loop: usize,
}

impl Emitter {
    fn new(config: &CompilerConfig) -> Self {
        Emitter {
            out: String::new(),
            indent: 0,
            indent_width: config.indent_width,
            max_string_len: config.max_string_len,
            buffer_size: config.string_buffer_size(),
            scopes: ScopeStack::new(),
            next_temp: 0,
            next_loop: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent * self.indent_width {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn temp(&mut self) -> String {
        let name = format!("_t{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn emit_program(&mut self, program: &Program) -> Result<(), CompileError> {
        self.out.push_str(PRELUDE);
        self.indent = 1;
        for stmt in &program.stmts {
            self.emit_stmt(stmt)?;
        }
        let returned = matches!(program.stmts.last(), Some(Stmt { kind: StmtKind::Return(_), .. }));
        if !returned {
            self.line("return 0;");
        }
        self.indent = 0;
        self.line("}");
        Ok(())
    }

    /// Emit a block's statements one level deeper, in their own scope.
    fn emit_block(&mut self, block: &Block) -> Result<(), CompileError> {
        self.scopes.push();
        self.indent += 1;
        let result = block.stmts.iter().try_for_each(|stmt| self.emit_stmt(stmt));
        self.indent -= 1;
        self.scopes.pop();
        result
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match &stmt.kind {
            StmtKind::Let { name, value } => self.emit_let(name, value.as_ref(), stmt.pos)?,
            StmtKind::Return(None) => self.line("exit(0);"),
            StmtKind::Return(Some(expr)) => {
                if infer_type(expr, &self.scopes) == VarType::String {
                    return Err(CompileError::codegen(
                        expr.pos_or(stmt.pos),
                        "cannot return a string value",
                    ));
                }
                self.line(&format!("exit((int)({}));", translate(&expr.tokens)));
            }
            StmtKind::If { condition, then_block, else_block } => {
                let cond = self.required(condition, "'if' condition", stmt.pos)?;
                self.line(&format!("if ({cond}) {{"));
                self.emit_block(then_block)?;
                if let Some(block) = else_block {
                    self.line("} else {");
                    self.emit_block(block)?;
                }
                self.line("}");
            }
            StmtKind::While { condition, body } => {
                let cond = self.required(condition, "'while' condition", stmt.pos)?;
                self.line(&format!("while ({cond}) {{"));
                self.emit_block(body)?;
                self.line("}");
            }
            StmtKind::For { start, end, body } => self.emit_for(start, end, body, stmt.pos)?,
            StmtKind::Out(expr) => self.emit_out(expr, stmt.pos)?,
            StmtKind::In { name } => match self.scopes.lookup(name) {
                Some(VarType::String) => {
                    self.line(&format!("scanf(\"%{}s\", {name});", self.max_string_len));
                }
                _ => self.line(&format!("scanf(\"%lf\", &{name});")),
            },
            StmtKind::Break => self.line("break;"),
            StmtKind::Continue => self.line("continue;"),
            StmtKind::Expr(expr) => {
                if expr.is_empty() {
                    return Err(CompileError::codegen(stmt.pos, "missing expression"));
                }
                match self.string_assignment(expr) {
                    Some((target, value)) => self.line(&format!("strcpy({target}, {value});")),
                    None => self.line(&format!("{};", translate(&expr.tokens))),
                }
            }
        }
        Ok(())
    }

    fn required(&self, expr: &Expr, what: &str, pos: Pos) -> Result<String, CompileError> {
        if expr.is_empty() {
            return Err(CompileError::codegen(pos, format!("missing {what}")));
        }
        Ok(translate(&expr.tokens))
    }

    /// A `let` whose initializer reads the name it declares (shadowing an
    /// outer binding) is staged through a temporary, since in C the new name
    /// is already in scope inside its own initializer.
    fn emit_let(&mut self, name: &str, value: Option<&Expr>, pos: Pos) -> Result<(), CompileError> {
        let ty = value.map_or(VarType::Double, |expr| infer_type(expr, &self.scopes));
        let self_referencing = value.is_some_and(|expr| expr.idents().any(|t| t.lexeme == name));
        match (ty, value) {
            (VarType::String, Some(expr)) => match expr.single() {
                Some(tok) if tok.kind == TokenKind::Str => {
                    self.line(&format!("char {name}[{}] = {};", self.buffer_size, token_text(tok)));
                }
                Some(tok) if tok.kind == TokenKind::Ident => {
                    let mut source = tok.lexeme.clone();
                    if self_referencing {
                        let tmp = self.temp();
                        self.line(&format!("char {tmp}[{}];", self.buffer_size));
                        self.line(&format!("strcpy({tmp}, {source});"));
                        source = tmp;
                    }
                    self.line(&format!("char {name}[{}];", self.buffer_size));
                    self.line(&format!("strcpy({name}, {source});"));
                }
                _ => {
                    return Err(CompileError::codegen(
                        expr.pos_or(pos),
                        format!("string variable '{name}' must be initialized from a single string value"),
                    ));
                }
            },
            (_, Some(expr)) if self_referencing => {
                let tmp = self.temp();
                self.line(&format!("double {tmp} = {};", translate(&expr.tokens)));
                self.line(&format!("double {name} = {tmp};"));
            }
            (_, Some(expr)) => self.line(&format!("double {name} = {};", translate(&expr.tokens))),
            (_, None) => self.line(&format!("double {name} = 0.0;")),
        }
        self.scopes.declare(name, ty).map_err(|_| {
            CompileError::codegen(pos, format!("variable '{name}' declared twice in the same block"))
        })
    }

    /// `out` prints string literals and string variables with `%s`. Numbers
    /// go through a temporary so whole values print without a fraction.
    fn emit_out(&mut self, expr: &Expr, pos: Pos) -> Result<(), CompileError> {
        if expr.is_empty() {
            return Err(CompileError::codegen(pos, "missing expression after 'out'"));
        }
        if let Some(tok) = expr.single().filter(|t| self.scopes.is_string_operand(t)) {
            self.line(&format!("printf(\"%s\\n\", {});", token_text(tok)));
            return Ok(());
        }
        let tmp = self.temp();
        self.line(&format!("double {tmp} = {};", translate(&expr.tokens)));
        self.line(&format!("if (floor({tmp}) == ceil({tmp})) printf(\"%.0f\\n\", {tmp});"));
        self.line(&format!("else printf(\"%f\\n\", {tmp});"));
        Ok(())
    }

    /// Inclusive counting loop. A single identifier as start bound is used
    /// as the counter itself; any other start gets a fresh counter. Bounds
    /// that are not a single token are evaluated once, before the loop.
    fn emit_for(&mut self, start: &Expr, end: &Expr, body: &Block, pos: Pos) -> Result<(), CompileError> {
        self.next_loop += 1;
        let id = self.next_loop;

        for (bound, what) in [(start, "start"), (end, "end")] {
            if bound.is_empty() {
                return Err(CompileError::codegen(pos, format!("missing 'for' {what} bound")));
            }
            if infer_type(bound, &self.scopes) == VarType::String {
                return Err(CompileError::codegen(
                    bound.pos_or(pos),
                    format!("'for' {what} bound must be a number"),
                ));
            }
        }

        let header = match start.single() {
            Some(tok) if tok.kind == TokenKind::Ident => {
                let limit = self.hoist(end, &format!("_end{id}"));
                format!("for (; {0} <= {limit}; {0}++) {{", tok.lexeme)
            }
            _ => {
                let init = self.hoist(start, &format!("_start{id}"));
                let limit = self.hoist(end, &format!("_end{id}"));
                let var = format!("_i{id}");
                format!("for (double {var} = {init}; {var} <= {limit}; {var}++) {{")
            }
        };
        self.line(&header);
        self.emit_block(body)?;
        self.line("}");
        Ok(())
    }

    /// C text for a loop bound: a single token is used in place, anything
    /// else is evaluated into `name` first.
    fn hoist(&mut self, bound: &Expr, name: &str) -> String {
        match bound.single() {
            Some(tok) if tok.kind.is_operand() => token_text(tok),
            _ => {
                self.line(&format!("double {name} = {};", translate(&bound.tokens)));
                name.to_string()
            }
        }
    }

    /// Recognize `s = "text"` and `s = t` where `s` is a string variable.
    fn string_assignment(&self, expr: &Expr) -> Option<(String, String)> {
        match expr.tokens.as_slice() {
            [target, assign, value]
                if target.kind == TokenKind::Ident
                    && assign.kind == TokenKind::Assign
                    && self.scopes.lookup(&target.lexeme) == Some(VarType::String) =>
            {
                self.scopes
                    .is_string_operand(value)
                    .then(|| (target.lexeme.clone(), token_text(value)))
            }
            _ => None,
        }
    }
}
