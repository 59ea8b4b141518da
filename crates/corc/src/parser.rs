use crate::ast::*;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parse a whole program, pulling tokens from `lexer` one at a time.
pub fn parse(lexer: Lexer<'_>) -> Result<Program, CompileError> {
    let mut parser = Parser::new(lexer)?;
    parser.parse_program()
}

/// Lex and parse `source` with the given settings.
pub fn parse_source(source: &str, config: &CompilerConfig) -> Result<Program, CompileError> {
    parse(Lexer::with_config(source, config))
}

/// Recursive-descent parser with a single token of lookahead. The first
/// syntax error aborts parsing; there is no recovery.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
}

impl<'src> Parser<'src> {
    /// Prime the lookahead with the first token.
    pub fn new(mut lexer: Lexer<'src>) -> Result<Self, CompileError> {
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, CompileError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn eat(&mut self, expected: TokenKind) -> Result<Token, CompileError> {
        if self.check(expected) {
            self.advance()
        } else {
            Err(self.error(format!("expected {expected}, got {}", self.describe_current())))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        Ok(self.eat(TokenKind::Ident)?.lexeme)
    }

    fn describe_current(&self) -> String {
        match self.current.kind {
            TokenKind::Ident | TokenKind::Number | TokenKind::Unknown => {
                format!("{} '{}'", self.current.kind, self.current.lexeme)
            }
            kind => kind.to_string(),
        }
    }

    fn error(&self, msg: String) -> CompileError {
        CompileError::parse(self.current.pos(), msg)
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        tracing::debug!(statements = stmts.len(), "parsed program");
        Ok(Program { stmts })
    }

    fn parse_block(&mut self) -> Result<Block, CompileError> {
        self.eat(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.eat(TokenKind::RBrace)?;
        Ok(Block { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        let pos = self.current.pos();
        let kind = match self.current.kind {
            TokenKind::Let => {
                self.advance()?;
                let name = self.expect_ident()?;
                let value = if self.check(TokenKind::Assign) {
                    self.advance()?;
                    Some(self.parse_required_expr("after '='")?)
                } else {
                    None
                };
                self.eat(TokenKind::Semi)?;
                StmtKind::Let { name, value }
            }
            TokenKind::Ret => {
                self.advance()?;
                let value = self.parse_expr()?;
                self.eat(TokenKind::Semi)?;
                StmtKind::Return((!value.is_empty()).then_some(value))
            }
            TokenKind::If => {
                self.advance()?;
                let condition = self.parse_required_expr("as 'if' condition")?;
                let then_block = self.parse_block()?;
                let else_block = if self.check(TokenKind::Els) {
                    self.advance()?;
                    Some(self.parse_block()?)
                } else {
                    None
                };
                StmtKind::If { condition, then_block, else_block }
            }
            TokenKind::While => {
                self.advance()?;
                let condition = self.parse_required_expr("as 'while' condition")?;
                let body = self.parse_block()?;
                StmtKind::While { condition, body }
            }
            TokenKind::For => {
                self.advance()?;
                let start = self.parse_required_expr("as 'for' start bound")?;
                self.eat(TokenKind::Colon)?;
                let end = self.parse_required_expr("as 'for' end bound")?;
                let body = self.parse_block()?;
                StmtKind::For { start, end, body }
            }
            TokenKind::Out => {
                self.advance()?;
                let value = self.parse_required_expr("after 'out'")?;
                self.eat(TokenKind::Semi)?;
                StmtKind::Out(value)
            }
            TokenKind::In => {
                self.advance()?;
                let name = self.expect_ident()?;
                self.eat(TokenKind::Semi)?;
                StmtKind::In { name }
            }
            TokenKind::Brk => {
                self.advance()?;
                self.eat(TokenKind::Semi)?;
                StmtKind::Break
            }
            TokenKind::Con => {
                self.advance()?;
                self.eat(TokenKind::Semi)?;
                StmtKind::Continue
            }
            TokenKind::Ident | TokenKind::Number | TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.eat(TokenKind::Semi)?;
                StmtKind::Expr(expr)
            }
            _ => {
                return Err(self.error(format!(
                    "expected statement, got {}",
                    self.describe_current()
                )));
            }
        };
        Ok(Stmt::new(kind, pos))
    }

    /// Greedily collect expression tokens until the first token outside the
    /// expression set. Only parenthesis balance is checked; operator order
    /// and arity are left to the target compiler.
    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        let start = self.current.pos();
        let mut tokens = Vec::new();
        let mut depth = 0usize;

        while self.current.kind.is_expression_token() {
            match self.current.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    if depth == 0 {
                        return Err(self.error("unbalanced parentheses: unexpected ')'".into()));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            let tok = self.advance()?;
            let pos = tok.pos();
            tokens.push(ExprToken::new(tok.kind, tok.lexeme, pos));
        }

        if depth != 0 {
            return Err(CompileError::parse(
                start,
                format!("unbalanced parentheses: {depth} unclosed '('"),
            ));
        }
        Ok(Expr { tokens })
    }

    fn parse_required_expr(&mut self, context: &str) -> Result<Expr, CompileError> {
        let expr = self.parse_expr()?;
        if expr.is_empty() {
            return Err(self.error(format!(
                "expected expression {context}, got {}",
                self.describe_current()
            )));
        }
        Ok(expr)
    }
}
