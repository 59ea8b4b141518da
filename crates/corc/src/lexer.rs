use std::fmt;

use logos::Logos;
use serde::{Deserialize, Serialize};

use crate::config::CompilerConfig;
use crate::error::{CompileError, Pos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("let")]
    Let,
    #[token("ret")]
    Ret,
    #[token("if")]
    If,
    #[token("els")]
    Els,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("out")]
    Out,
    #[token("in")]
    In,
    #[token("brk")]
    Brk,
    #[token("con")]
    Con,
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // Literals
    #[regex(r"[0-9]+")]
    #[regex(r"[0-9]+\.[0-9]+")]
    #[regex(r"\.[0-9]+")]
    Number,
    #[regex(r#""[^"]*""#)]
    Str,
    #[regex(r#""[^"]*"#)]
    UnterminatedStr,

    // Identifiers
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", priority = 1)]
    Ident,

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Not,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Punctuation
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,

    /// A character no rule accepts. Rejected by the parser, not here.
    Unknown,
    Eof,
}

impl TokenKind {
    /// Tokens that may appear inside a flat expression.
    pub fn is_expression_token(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Number | Str | Ident
                | Assign | EqEq | NotEq | Not | Lt | LtEq | Gt | GtEq
                | Shl | Shr | Plus | Minus | Star | Slash | Percent
                | Amp | Pipe | Caret | Tilde | And | Or
                | LParen | RParen
        )
    }

    pub fn is_operand(self) -> bool {
        matches!(self, TokenKind::Number | TokenKind::Str | TokenKind::Ident)
    }

    /// Operators the target language only defines on integers.
    pub fn is_integer_operator(self) -> bool {
        use TokenKind::*;
        matches!(self, Percent | Caret | Pipe | Amp | Shl | Shr | Tilde)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Let => "'let'",
            Ret => "'ret'",
            If => "'if'",
            Els => "'els'",
            While => "'while'",
            For => "'for'",
            Out => "'out'",
            In => "'in'",
            Brk => "'brk'",
            Con => "'con'",
            And => "'and'",
            Or => "'or'",
            Number => "number",
            Str => "string literal",
            UnterminatedStr => "unterminated string literal",
            Ident => "identifier",
            Assign => "'='",
            EqEq => "'=='",
            NotEq => "'!='",
            Not => "'!'",
            Lt => "'<'",
            LtEq => "'<='",
            Gt => "'>'",
            GtEq => "'>='",
            Shl => "'<<'",
            Shr => "'>>'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Amp => "'&'",
            Pipe => "'|'",
            Caret => "'^'",
            Tilde => "'~'",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            Semi => "';'",
            Colon => "':'",
            Unknown => "unknown token",
            Eof => "end of file",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. String literals keep only their body.
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }
}

/// Words the generated C source cannot use as variable names: the C keywords
/// plus the library names the emitted code calls.
const TARGET_RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do",
    "double", "else", "enum", "extern", "float", "goto", "inline", "int",
    "long", "register", "restrict", "return", "short", "signed", "sizeof",
    "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "alignas", "alignof", "bool", "true", "false", "nullptr",
    "static_assert", "thread_local", "typeof", "constexpr",
    "main", "printf", "scanf", "strcpy", "strlen", "exit", "floor", "ceil",
    "puts", "putchar", "getchar", "malloc", "free", "memcpy", "memset",
    "sqrt", "pow", "fabs", "abs", "NULL", "EOF", "FILE", "stdin", "stdout",
    "stderr", "size_t", "errno", "assert",
    // GNU dialect keywords and predefined macros
    "asm", "typeof_unqual", "linux", "unix", "i386",
    // Object-like macros from the emitted headers
    "NAN", "INFINITY", "HUGE_VAL", "HUGE_VALF", "HUGE_VALL", "M_PI", "M_E",
    "FP_NAN", "FP_INFINITE", "FP_ZERO", "FP_NORMAL", "FP_SUBNORMAL",
    "EXIT_SUCCESS", "EXIT_FAILURE", "RAND_MAX", "MB_CUR_MAX",
    "BUFSIZ", "FILENAME_MAX", "FOPEN_MAX", "L_tmpnam", "TMP_MAX",
    "SEEK_SET", "SEEK_CUR", "SEEK_END", "EDOM", "ERANGE",
];

pub fn is_target_reserved(word: &str) -> bool {
    TARGET_RESERVED.contains(&word)
}

/// Pull-based lexer: hands out one token per `next_token` call.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    max_string_len: usize,
    cursor: usize,
    line: usize,
    line_start: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_config(source, &CompilerConfig::default())
    }

    pub fn with_config(source: &'src str, config: &CompilerConfig) -> Self {
        Lexer {
            source,
            inner: TokenKind::lexer(source),
            max_string_len: config.max_string_len,
            cursor: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// Produce the next token. Once `Eof` is reached every further call
    /// returns `Eof` again.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        let Some(result) = self.inner.next() else {
            let pos = self.pos_at(self.source.len());
            return Ok(Token { kind: TokenKind::Eof, lexeme: String::new(), line: pos.line, col: pos.col });
        };

        let span = self.inner.span();
        let pos = self.pos_at(span.start);
        let slice = self.inner.slice();

        let (kind, lexeme) = match result {
            Ok(TokenKind::UnterminatedStr) => {
                return Err(CompileError::lexer(pos, "unterminated string literal"));
            }
            Ok(TokenKind::Str) => {
                let body = &slice[1..slice.len() - 1];
                if body.len() > self.max_string_len {
                    return Err(CompileError::lexer(
                        pos,
                        format!("string literal exceeds {} bytes", self.max_string_len),
                    ));
                }
                (TokenKind::Str, body.to_string())
            }
            Ok(TokenKind::Ident) if is_target_reserved(slice) => {
                return Err(CompileError::lexer(
                    pos,
                    format!("'{slice}' is a reserved word in the target language"),
                ));
            }
            Ok(kind) => (kind, slice.to_string()),
            Err(()) => (TokenKind::Unknown, slice.to_string()),
        };

        tracing::trace!(?kind, lexeme = %lexeme, line = pos.line, col = pos.col, "token");
        Ok(Token { kind, lexeme, line: pos.line, col: pos.col })
    }

    /// Move the line/column bookkeeping forward to `offset` and report the
    /// position there.
    fn pos_at(&mut self, offset: usize) -> Pos {
        for (i, ch) in self.source[self.cursor..offset].char_indices() {
            if ch == '\n' {
                self.line += 1;
                self.line_start = self.cursor + i + 1;
            }
        }
        self.cursor = offset;
        let col = self.source[self.line_start..offset].chars().count() + 1;
        Pos::new(self.line, col)
    }
}

/// Lex the whole source, `Eof` token included.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    tokenize_with(source, &CompilerConfig::default())
}

pub fn tokenize_with(source: &str, config: &CompilerConfig) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer::with_config(source, config);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    tracing::debug!(count = tokens.len(), "lexed source");
    Ok(tokens)
}
