use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use cor_compiler::diagnostics;
use cor_compiler::lexer::{self, TokenKind};
use cor_compiler::{codegen, CompileError, CompilerConfig};

const SOURCE_EXTENSION: &str = "cor";

#[derive(Parser)]
#[command(name = "corc", version, about = "Compile Cor programs to C")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Compiler settings file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .cor source file to C.
    Build {
        /// Source file path (.cor)
        file: PathBuf,
        /// Output file path. Defaults to the source name with a .c extension;
        /// `-` writes to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Lex, parse and analyze a source file and report diagnostics.
    Check {
        /// Source file path (.cor)
        file: PathBuf,
        /// Print diagnostics as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the token stream of a source file.
    Tokens {
        /// Source file path (.cor)
        file: PathBuf,
    },
    /// Dump the AST of a source file as JSON.
    Ast {
        /// Source file path (.cor)
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        let code = e.downcast_ref::<CompileError>().map_or(1, CompileError::exit_code);
        process::exit(code);
    }
}

fn init_logging(verbose: u8, json: bool) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().with_current_span(false).init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => CompilerConfig::from_json_file(path)?,
        None => CompilerConfig::default(),
    };

    match cli.command {
        Command::Build { file, output } => {
            let source = read_source(&file)?;
            let out_path = output.unwrap_or_else(|| file.with_extension("c"));
            if out_path.as_os_str() == "-" {
                let program = cor_compiler::front_end(&source, &config)?;
                codegen::emit_to(&program, &config, &mut io::stdout().lock())?;
            } else {
                cor_compiler::compile_to_path(&source, &config, &out_path)?;
                eprintln!("compiled {} -> {}", file.display(), out_path.display());
            }
        }
        Command::Check { file, json } => {
            let source = read_source(&file)?;
            let file_str = file.display().to_string();
            let ds = diagnostics::check_source(&file_str, &source, &config);

            if json {
                println!("{}", ds.to_json());
            } else {
                let human = ds.to_human();
                if human.is_empty() {
                    println!("no diagnostics");
                } else {
                    print!("{human}");
                }
            }

            if ds.has_errors() {
                process::exit(ds.exit_code());
            }
        }
        Command::Tokens { file } => {
            let source = read_source(&file)?;
            println!("{:<6} {:<6} {:<28} LEXEME", "LINE", "COL", "KIND");
            for token in lexer::tokenize_with(&source, &config)? {
                if token.kind == TokenKind::Eof {
                    break;
                }
                println!(
                    "{:<6} {:<6} {:<28} {}",
                    token.line,
                    token.col,
                    token.kind.to_string(),
                    token.lexeme
                );
            }
        }
        Command::Ast { file } => {
            let source = read_source(&file)?;
            let program = cor_compiler::parser::parse_source(&source, &config)?;
            let json = serde_json::to_string_pretty(&program)?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Read a source file, rejecting anything without the `.cor` extension.
fn read_source(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
        return Err(format!(
            "{}: source files must have the .{SOURCE_EXTENSION} extension",
            path.display()
        )
        .into());
    }
    let source = fs::read_to_string(path).map_err(CompileError::from)?;
    tracing::info!(file = %path.display(), bytes = source.len(), "read source");
    Ok(source)
}
