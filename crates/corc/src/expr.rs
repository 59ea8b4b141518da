//! Translation of flat expressions into C expression text.
//!
//! Numbers are forced to floating point, `and`/`or` become `&&`/`||`, and the
//! operators C only defines on integers get their operands cast. There is no
//! typed tree to decide casts up front, so the operand already written before
//! such an operator is rewritten in place, and the operand after it is
//! consumed and wrapped as it is written.

use crate::ast::ExprToken;
use crate::lexer::TokenKind;

pub const INT_CAST_TYPE: &str = "long long";

/// Wrap C expression text in an integer cast.
pub fn int_cast(text: &str) -> String {
    format!("(({INT_CAST_TYPE})({text}))")
}

/// Byte range of the operand most recently written to an output buffer. It
/// always ends at the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandSpan {
    pub start: usize,
    pub len: usize,
}

impl OperandSpan {
    pub fn text<'a>(&self, out: &'a str) -> &'a str {
        &out[self.start..self.start + self.len]
    }
}

/// Rewrite the trailing operand at `span` into its integer cast and return
/// the span of the rewritten text.
pub fn cast_trailing_operand(out: &mut String, span: OperandSpan) -> OperandSpan {
    debug_assert_eq!(span.start + span.len, out.len());
    let operand = out.split_off(span.start);
    let cast = int_cast(&operand);
    out.push_str(&cast);
    OperandSpan { start: span.start, len: cast.len() }
}

/// C text for a single token.
pub fn token_text(tok: &ExprToken) -> String {
    match tok.kind {
        TokenKind::Number if tok.lexeme.contains('.') => tok.lexeme.clone(),
        TokenKind::Number => format!("{}.0", tok.lexeme),
        TokenKind::Str => format!("\"{}\"", tok.lexeme),
        TokenKind::And => "&&".into(),
        TokenKind::Or => "||".into(),
        _ => tok.lexeme.clone(),
    }
}

/// Translate a token run into C expression text.
pub fn translate(tokens: &[ExprToken]) -> String {
    let mut writer = ExprWriter::default();
    let mut i = 0;
    while i < tokens.len() {
        i = writer.write_token(tokens, i);
    }
    writer.out
}

#[derive(Default)]
struct ExprWriter {
    out: String,
    last_operand: Option<OperandSpan>,
    /// `last_operand` is already an integer cast.
    last_cast: bool,
    /// The last token written was a sign in prefix position.
    unary: bool,
    open_groups: Vec<usize>,
}

impl ExprWriter {
    fn separate(&mut self, next: TokenKind) {
        let glued = self.out.is_empty()
            || self.unary
            || next == TokenKind::RParen
            || self.out.ends_with(|c| matches!(c, '(' | '!' | '~'));
        if !glued {
            self.out.push(' ');
        }
    }

    fn push_operand(&mut self, text: &str, cast: bool) {
        let start = self.out.len();
        self.out.push_str(text);
        self.last_operand = Some(OperandSpan { start, len: text.len() });
        self.last_cast = cast;
    }

    /// Write `tokens[i]` and return the index of the next unwritten token.
    fn write_token(&mut self, tokens: &[ExprToken], i: usize) -> usize {
        let tok = &tokens[i];
        self.separate(tok.kind);
        self.unary = false;
        match tok.kind {
            kind if kind.is_operand() => {
                self.push_operand(&token_text(tok), false);
                i + 1
            }
            TokenKind::LParen => {
                self.open_groups.push(self.out.len());
                self.out.push('(');
                self.last_operand = None;
                i + 1
            }
            TokenKind::RParen => {
                self.out.push(')');
                let end = self.out.len();
                self.last_operand = self
                    .open_groups
                    .pop()
                    .map(|start| OperandSpan { start, len: end - start });
                self.last_cast = false;
                i + 1
            }
            kind if kind.is_integer_operator() => {
                if kind != TokenKind::Tilde && !self.last_cast {
                    if let Some(span) = self.last_operand.take() {
                        // The separator was already written after the operand.
                        let sep = self.out.split_off(span.start + span.len);
                        cast_trailing_operand(&mut self.out, span);
                        self.out.push_str(&sep);
                    }
                }
                self.out.push_str(&tok.lexeme);
                self.last_operand = None;
                match next_operand(tokens, i + 1) {
                    Some((text, next)) => {
                        self.separate(TokenKind::Number);
                        self.push_operand(&int_cast(&text), true);
                        next
                    }
                    None => i + 1,
                }
            }
            kind => {
                self.unary = matches!(kind, TokenKind::Minus | TokenKind::Plus)
                    && self.last_operand.is_none();
                self.out.push_str(&token_text(tok));
                self.last_operand = None;
                i + 1
            }
        }
    }
}

/// The operand starting at `tokens[i]`: prefix operators followed by a single
/// token or a parenthesized group. Returns its C text and the index after it.
fn next_operand(tokens: &[ExprToken], i: usize) -> Option<(String, usize)> {
    let mut k = i;
    while tokens.get(k).is_some_and(|t| is_prefix_operator(t.kind)) {
        k += 1;
    }
    let end = match tokens.get(k)?.kind {
        kind if kind.is_operand() => k + 1,
        TokenKind::LParen => matching_paren(tokens, k).map_or(tokens.len(), |close| close + 1),
        _ => return None,
    };
    Some((translate(&tokens[i..end]), end))
}

fn is_prefix_operator(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Minus | TokenKind::Plus | TokenKind::Not | TokenKind::Tilde)
}

fn matching_paren(tokens: &[ExprToken], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, tok) in tokens[open..].iter().enumerate() {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
