//! End-to-end tests: source text in, C file on disk out.

use std::fs;

use cor_compiler::{compile_to_path, CompileError, CompilerConfig};

const COUNTDOWN: &str = r#"
// count down and report parity
let n = 5;
let label = "done";
for 1 : n {
    if n % 2 == 0 { out "even"; } els { out n; }
    n = n - 1;
}
out label;
"#;

#[test]
fn test_compile_to_path_writes_c() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("countdown.c");
    compile_to_path(COUNTDOWN, &CompilerConfig::default(), &path).unwrap();

    let c = fs::read_to_string(&path).unwrap();
    assert!(c.starts_with("#include <stdio.h>"));
    assert!(c.contains("int main(void) {"));
    assert!(c.contains("for (double _i1 = 1.0; _i1 <= n; _i1++) {"));
    assert!(c.contains("if (((long long)(n)) % ((long long)(2.0)) == 0.0) {"));
    assert!(c.contains(r#"printf("%s\n", "even");"#));
    assert!(c.contains(r#"char label[256] = "done";"#));
    assert!(c.trim_end().ends_with("return 0;\n}"));
}

#[test]
fn test_failed_compile_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.c");
    let err = compile_to_path("let s = \"x\"; ret s;", &CompilerConfig::default(), &path).unwrap_err();
    assert!(matches!(err, CompileError::Codegen { .. }));
    assert!(!path.exists());

    let err = compile_to_path("out missing;", &CompilerConfig::default(), &path).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(!path.exists());
}

#[test]
fn test_unwritable_output_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("out.c");
    let err = compile_to_path("out 1;", &CompilerConfig::default(), &path).unwrap_err();
    assert!(matches!(err, CompileError::Io(_)));
    assert_eq!(err.exit_code(), 8);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corc.json");
    let config = CompilerConfig { max_string_len: 31, indent_width: 2, check_semantics: true };
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = CompilerConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);

    let out = dir.path().join("out.c");
    compile_to_path("let s = \"hi\"; in s;", &loaded, &out).unwrap();
    let c = fs::read_to_string(&out).unwrap();
    assert!(c.contains("  char s[32] = \"hi\";"));
    assert!(c.contains("  scanf(\"%31s\", s);"));
}

#[test]
fn test_config_file_missing_or_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(CompilerConfig::from_json_file(&missing), Err(CompileError::Io(_))));

    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"max_string_len": "long"}"#).unwrap();
    assert!(matches!(CompilerConfig::from_json_file(&bad), Err(CompileError::Config(_))));
}
