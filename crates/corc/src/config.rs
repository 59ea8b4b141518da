use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Upper bound for `max_string_len`; string variables live on the stack of
/// the generated `main`.
pub const MAX_STRING_LEN_LIMIT: usize = 65_535;

/// Compiler settings. Every field has a default, so a config file only needs
/// to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Longest accepted string literal body, in bytes.
    pub max_string_len: usize,
    /// Spaces per nesting level in generated code.
    pub indent_width: usize,
    /// Run the semantic analyzer before generation.
    pub check_semantics: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            max_string_len: 255,
            indent_width: 4,
            check_semantics: true,
        }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let config: CompilerConfig = serde_json::from_str(json)
            .map_err(|e| CompileError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CompileError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.max_string_len == 0 {
            return Err(CompileError::Config("max_string_len must be at least 1".into()));
        }
        if self.max_string_len > MAX_STRING_LEN_LIMIT {
            return Err(CompileError::Config(format!(
                "max_string_len must be at most {MAX_STRING_LEN_LIMIT}"
            )));
        }
        Ok(())
    }

    /// Size of the character buffer backing a string variable (body plus NUL).
    pub fn string_buffer_size(&self) -> usize {
        self.max_string_len.saturating_add(1)
    }
}
