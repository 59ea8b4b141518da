pub mod lexer;
pub mod ast;
pub mod parser;
pub mod scope;
pub mod semantic;
pub mod expr;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;

pub use config::CompilerConfig;
pub use error::{CompileError, Pos, SemanticError, SemanticErrorKind};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ast::Program;

/// Compile source text to C source with the default settings.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_with(source, &CompilerConfig::default())
}

pub fn compile_with(source: &str, config: &CompilerConfig) -> Result<String, CompileError> {
    let program = front_end(source, config)?;
    codegen::generate(&program, config)
}

/// Compile `source` and write the C output to `path`. The file is only
/// created once generation has succeeded.
pub fn compile_to_path(source: &str, config: &CompilerConfig, path: &Path) -> Result<(), CompileError> {
    let program = front_end(source, config)?;
    let generated = codegen::generate(&program, config)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(generated.as_bytes())?;
    writer.flush()?;
    tracing::info!(path = %path.display(), bytes = generated.len(), "wrote C output");
    Ok(())
}

/// Lex, parse and (per `config`) analyze.
pub fn front_end(source: &str, config: &CompilerConfig) -> Result<Program, CompileError> {
    let program = parser::parse_source(source, config)?;
    if config.check_semantics {
        semantic::analyze(&program)?;
    }
    Ok(program)
}
