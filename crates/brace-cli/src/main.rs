use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use brace_lexer::Scanner;
use brace_parser::{print_tree, ParseOptions, TrailingInput};
use brace_template::{Template, TemplateOptions, UnresolvedPolicy};
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brace")]
#[command(about = "brace: render {{ .Name }} placeholder templates")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Fail when tokens remain after the template is accepted
    #[arg(long, global = true)]
    strict_trailing: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a template for errors without rendering it
    Check {
        /// Template file
        path: String,
    },

    /// List the tokens of a template
    Tokens {
        /// Template file
        path: String,
    },

    /// Print the parse tree of a template
    Tree {
        /// Template file
        path: String,

        /// Print the lowered AST instead of the parse tree
        #[arg(long)]
        ast: bool,
    },

    /// Render a template to stdout
    Render {
        /// Template file
        path: String,

        /// JSON object with field values
        #[arg(long)]
        data: Option<String>,

        /// Set one field; wins over --data
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Fail on placeholders without a value instead of writing them back
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let trailing = if cli.strict_trailing {
        TrailingInput::Error
    } else {
        TrailingInput::Warn
    };
    let parse = ParseOptions::new().with_trailing_input(trailing);

    match cli.command {
        Command::Check { path } => cmd_check(&path, parse),
        Command::Tokens { path } => cmd_tokens(&path),
        Command::Tree { path, ast } => cmd_tree(&path, parse, ast),
        Command::Render {
            path,
            data,
            set,
            strict,
        } => cmd_render(&path, parse, data.as_deref(), set, strict),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {arg:?}")),
    }
}

fn read_source(path: &str) -> Vec<u8> {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn load_template(path: &str, options: TemplateOptions) -> Template {
    let source = read_source(path);
    match Template::from_bytes_with(&source, options) {
        Ok(template) => template,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Field values from a JSON object file. Strings are taken verbatim, other
/// values as their JSON text.
fn load_data(path: Option<&str>, set: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();

    if let Some(path) = path {
        let text = read_source(path);
        let value: serde_json::Value = match serde_json::from_slice(&text) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Error reading {path}: {e}");
                std::process::exit(1);
            }
        };
        let serde_json::Value::Object(fields) = value else {
            eprintln!("Error: {path} must hold a JSON object");
            std::process::exit(1);
        };
        for (name, value) in fields {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            data.insert(name, text);
        }
    }

    data.extend(set);
    data
}

fn cmd_check(path: &str, parse: ParseOptions) {
    let template = load_template(path, TemplateOptions::new().with_parse(parse));
    let names = template.unresolved();
    log::info!("{} placeholder(s): {}", names.len(), names.join(", "));
    eprintln!("OK: {path}");
}

fn cmd_tokens(path: &str) {
    let source = read_source(path);
    let tokens = match Scanner::tokenize_bytes(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut out = io::stdout().lock();
    for token in &tokens {
        let line = format!(
            "{}:{}\t{}\t{:?}",
            token.span.line,
            token.span.column,
            token.kind.grammar_name(),
            token.text().unwrap_or_default()
        );
        if writeln!(out, "{line}").is_err() {
            std::process::exit(1);
        }
    }
}

fn cmd_tree(path: &str, parse: ParseOptions, ast: bool) {
    if ast {
        let template = load_template(path, TemplateOptions::new().with_parse(parse));
        println!("{}", print_tree(template.root()));
        return;
    }

    let source = read_source(path);
    let tree = Scanner::tokenize_bytes(&source)
        .map_err(|e| e.to_string())
        .and_then(|tokens| brace_parser::template::parse_tokens(tokens, &parse).map_err(|e| e.to_string()));
    match tree {
        Ok(tree) => println!("{}", print_tree(&tree)),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_render(path: &str, parse: ParseOptions, data: Option<&str>, set: Vec<(String, String)>, strict: bool) {
    let unresolved = if strict {
        UnresolvedPolicy::Error
    } else {
        UnresolvedPolicy::Preserve
    };
    let options = TemplateOptions::new()
        .with_parse(parse)
        .with_unresolved(unresolved);

    let mut template = load_template(path, options);
    let data = load_data(data, set);

    if let Err(e) = template.execute(io::stdout().lock(), &data) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
