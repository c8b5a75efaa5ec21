use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use relish::data::loader::{self, LoadOptions};
use relish::data::sample::load_sample_data;
use relish::data::workspace;
use relish::parsing::{Lexer, Parser, TokenKind};
use relish::{compile_and_eval, render, Environment, Executor, Output};

const HISTORY_FILE: &str = ".relish_history";

#[derive(ClapParser)]
#[command(author, version, about = "relish - a terse relational algebra interpreter")]
struct Cli {
    /// CSV/TSV or workspace files to load before starting
    /// (relation names come from the file stem)
    #[arg(short, long, value_name = "FILE")]
    load: Vec<PathBuf>,

    /// Start with the built-in sample relations
    #[arg(long)]
    sample: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (the default)
    Shell,

    /// Evaluate a single query and print the result
    Eval {
        /// The query to evaluate
        query: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut env = Environment::new();
    if cli.sample {
        load_sample_data(&mut env);
    }
    for path in &cli.load {
        load_file(&mut env, path)?;
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(&mut env),
        Commands::Eval { query } => match compile_and_eval(&query, &env) {
            Ok(output) => {
                println!("{}", render::format_output(&output));
                Ok(())
            }
            Err(err) => bail!("{}", err),
        },
    }
}

/// Load one file into the environment: a workspace brings all of its
/// bindings, anything else is read as delimited data named after the stem.
fn load_file(env: &mut Environment, path: &Path) -> Result<()> {
    if workspace::sniff(path) {
        let relations =
            workspace::load(path).with_context(|| format!("loading {}", path.display()))?;
        for (name, rel) in relations {
            env.bind(name, rel);
        }
        return Ok(());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("file name is not a usable relation name")?
        .to_owned();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") => b'\t',
        _ => b',',
    };
    let options = LoadOptions {
        delimiter,
        genkey: None,
    };
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rel = loader::load(file, &options).with_context(|| format!("loading {}", path.display()))?;
    debug!(name, tuples = rel.len(), "bound relation");
    env.bind(name, rel);
    Ok(())
}

fn run_shell(env: &mut Environment) -> Result<()> {
    let mut editor: Editor<(), DefaultHistory> = Editor::new()?;
    let _ = editor.load_history(HISTORY_FILE);

    println!("relish - a terse relational algebra");
    println!("Commands: \\load (sample data), \\env, \\open FILE, \\save FILE, \\quit");
    println!();

    loop {
        let line = match editor.readline("relish> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        if let Some(command) = line.strip_prefix('\\') {
            if !handle_command(command, env) {
                break;
            }
            continue;
        }

        match run_line(line, env) {
            Ok(text) => println!("{}\n", text),
            Err(err) => println!("Error: {}\n", err),
        }
    }

    let _ = editor.save_history(HISTORY_FILE);
    Ok(())
}

/// Handle a backslash command; returns false to exit the shell.
fn handle_command(command: &str, env: &mut Environment) -> bool {
    let mut words = command.split_whitespace();
    match words.next() {
        Some("q") | Some("quit") => return false,
        Some("load") => {
            load_sample_data(env);
            println!("Loaded: E (employees), D (departments), Phone, ContractorPay");
        }
        Some("env") => {
            if env.is_empty() {
                println!("(no relations loaded)");
            } else {
                for (name, rel) in env.iter() {
                    let attrs: Vec<&str> = rel.schema().iter().map(String::as_str).collect();
                    println!("  {}: {} tuples, attrs: [{}]", name, rel.len(), attrs.join(" "));
                }
            }
        }
        Some("open") => match words.next() {
            Some(path) => match load_file(env, Path::new(path)) {
                Ok(()) => println!("Opened {}", path),
                Err(err) => println!("Error: {:#}", err),
            },
            None => println!("Usage: \\open FILE"),
        },
        Some("save") => match words.next() {
            Some(path) => match workspace::save(env, Path::new(path)) {
                Ok(()) => println!("Saved {}", path),
                Err(err) => println!("Error: {}", err),
            },
            None => println!("Usage: \\save FILE"),
        },
        Some(other) => println!("Unknown command: \\{}", other),
        None => println!("Unknown command: \\"),
    }
    true
}

/// Evaluate one line: either `name := chain` assignment sugar, or a plain
/// query. Assignment evaluates the chain, requires a relation, and binds it.
fn run_line(line: &str, env: &mut Environment) -> relish::Result<String> {
    let tokens = Lexer::new(line).tokenize()?;

    let assign_to = match (tokens.first().map(|t| &t.kind), tokens.get(1).map(|t| &t.kind)) {
        (Some(TokenKind::Ident(name)), Some(TokenKind::ColonEq)) => Some(name.clone()),
        _ => None,
    };

    if let Some(name) = assign_to {
        let expr = Parser::new(tokens[2..].to_vec()).parse()?;
        let rel = Executor::new(env)
            .execute(&expr)?
            .into_relation("assignment")?;
        let summary = format!("{} := {} tuples", name, rel.len());
        env.bind(name, rel);
        return Ok(summary);
    }

    let expr = Parser::new(tokens).parse()?;
    let output: Output = Executor::new(env).execute(&expr)?;
    Ok(render::format_output(&output))
}
