use clap::{ArgAction, Parser, Subcommand};
use duo_lexer::{Lexer, TokenKind};
use duo_parser::diagnostic::Reporter;
use duo_parser::{parse_with, Diagnostic, Fragment, ParseOptions, ScriptGrammar};
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duo")]
#[command(about = "duo component template parser")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). DUO_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a template and print its syntax tree as JSON
    Parse {
        /// Input template file
        path: String,

        /// Skip whitespace normalization
        #[arg(long)]
        raw: bool,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Check a template for syntax errors without printing the tree
    Check {
        /// Input template file
        path: String,
    },

    /// Print the lexer's token stream, one token per line
    Tokens {
        /// Input template file
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse { path, raw, compact } => cmd_parse(&path, raw, compact),
        Command::Check { path } => cmd_check(&path),
        Command::Tokens { path } => cmd_tokens(&path),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DUO_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => {
            debug!(path, bytes = source.len(), "read source");
            source
        }
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn parse_file(path: &str, source: &str, normalize: bool) -> Fragment {
    let options = ParseOptions {
        filename: Some(path.to_string()),
        normalize,
    };
    match parse_with(source, &ScriptGrammar, &options) {
        Ok(fragment) => fragment,
        Err(e) => {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_parse(path: &str, raw: bool, compact: bool) {
    let source = read_source(path);
    let fragment = parse_file(path, &source, !raw);

    let json = if compact {
        serde_json::to_string(&fragment)
    } else {
        serde_json::to_string_pretty(&fragment)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing syntax tree: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_check(path: &str) {
    let source = read_source(path);
    match check_source(path, &source) {
        Ok(report) => println!("{report}"),
        Err(e) => {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        }
    }
}

/// The line `duo check` prints on success.
fn check_source(path: &str, source: &str) -> Result<String, Diagnostic> {
    let options = ParseOptions {
        filename: Some(path.to_string()),
        normalize: true,
    };
    let fragment = parse_with(source, &ScriptGrammar, &options)?;
    info!(nodes = fragment.children.len(), "check passed");
    Ok(format!("OK: {path}"))
}

fn cmd_tokens(path: &str) {
    let source = read_source(path);
    let mut lexer = Lexer::new(&source);
    loop {
        match lexer.next_token() {
            Ok(token) => {
                println!("{token}");
                if token.kind == TokenKind::Eof {
                    break;
                }
            }
            Err(e) => {
                let diagnostic = Reporter::new(&source, Some(path)).from_lexer(e);
                eprintln!("Lex error: {diagnostic}");
                std::process::exit(1);
            }
        }
    }
}
