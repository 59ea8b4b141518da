use serde::{Deserialize, Serialize};

use crate::error::{CompileError, SemanticErrorKind};

/// Stable error codes.
pub const E001_LEXER: &str = "E001";
pub const E002_PARSE: &str = "E002";
pub const E003_UNDECLARED_VAR: &str = "E003";
pub const E004_REDECLARED_VAR: &str = "E004";
pub const E005_TYPE_MISMATCH: &str = "E005";
pub const E006_BREAK_OUTSIDE_LOOP: &str = "E006";
pub const E007_CONTINUE_OUTSIDE_LOOP: &str = "E007";
pub const E008_CODEGEN: &str = "E008";
pub const E009_IO: &str = "E009";

/// A structured, machine-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
    /// Process exit status the CLI reports for this diagnostic.
    pub exit_code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub col: usize,
}

impl Diagnostic {
    pub fn error(code: &str, message: String) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity: Severity::Error,
            message,
            location: None,
            exit_code: 1,
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn at(mut self, file: &str, line: usize, col: usize) -> Self {
        self.location = Some(SourceLocation { file: file.to_string(), line, col });
        self
    }

    /// Convert a compile failure into a diagnostic located in `file`.
    pub fn from_error(file: &str, err: &CompileError) -> Self {
        let (code, message) = match err {
            CompileError::Lexer { msg, .. } => (E001_LEXER, msg.clone()),
            CompileError::Parse { msg, .. } => (E002_PARSE, msg.clone()),
            CompileError::Semantic(e) => {
                let code = match e.kind() {
                    SemanticErrorKind::UndeclaredVariable => E003_UNDECLARED_VAR,
                    SemanticErrorKind::RedeclaredVariable => E004_REDECLARED_VAR,
                    SemanticErrorKind::TypeMismatch => E005_TYPE_MISMATCH,
                    SemanticErrorKind::BreakOutsideLoop => E006_BREAK_OUTSIDE_LOOP,
                    SemanticErrorKind::ContinueOutsideLoop => E007_CONTINUE_OUTSIDE_LOOP,
                };
                (code, e.to_string())
            }
            CompileError::Codegen { msg, .. } => (E008_CODEGEN, msg.clone()),
            CompileError::Config(_) | CompileError::Io(_) => (E009_IO, err.to_string()),
        };
        let diag = Diagnostic::error(code, message).with_exit_code(err.exit_code());
        match err.pos() {
            Some(pos) => diag.at(file, pos.line, pos.col),
            None => diag,
        }
    }
}

/// Top-level diagnostics output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticSet {
    pub version: u32,
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSet {
    pub fn new(file: &str) -> Self {
        DiagnosticSet {
            version: 1,
            file: file.to_string(),
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Exit status for the set: that of the first error, or 0.
    pub fn exit_code(&self) -> i32 {
        self.diagnostics
            .iter()
            .find(|d| d.severity == Severity::Error)
            .map_or(0, |d| d.exit_code)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".into())
    }

    pub fn to_human(&self) -> String {
        let mut out = String::new();
        for d in &self.diagnostics {
            let sev = match d.severity {
                Severity::Error => "error",
            };
            match &d.location {
                Some(loc) => out.push_str(&format!(
                    "[{}] {}:{}:{}: {}: {}\n",
                    d.code, loc.file, loc.line, loc.col, sev, d.message,
                )),
                None => out.push_str(&format!("[{}] {}: {}\n", d.code, sev, d.message)),
            }
        }
        out
    }
}

/// Run the front end over `source` and collect its outcome as diagnostics.
/// The front end stops at the first failure, so the set holds at most one.
pub fn check_source(file: &str, source: &str, config: &crate::CompilerConfig) -> DiagnosticSet {
    let mut ds = DiagnosticSet::new(file);
    if let Err(e) = crate::front_end(source, config) {
        ds.push(Diagnostic::from_error(file, &e));
    }
    ds
}
