//! Keysheet CLI - run spreadsheet keywords from the command line

mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keysheet::{ExcelLibrary, KeywordValue};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "keysheet")]
#[command(
    author,
    version,
    about = "Run spreadsheet keywords against .xls and .xlsx workbooks"
)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List keywords with their arguments
    Keywords,

    /// Show the documentation of a keyword, or of the library for `__intro__`
    Doc {
        /// Keyword name in any spelling, e.g. "Open Excel"
        keyword: String,
    },

    /// Run a keyword script, one keyword per line
    Run {
        /// Script file, or `-` for stdin
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Keywords => list_keywords(),
        Commands::Doc { keyword } => show_doc(&keyword),
        Commands::Run { script } => run_script(&script),
    }
}

fn list_keywords() -> Result<()> {
    let library = ExcelLibrary::new();
    for name in library.keyword_names() {
        let args = library.keyword_arguments(name)?;
        if args.is_empty() {
            println!("{}", name);
        } else {
            println!("{}\t{}", name, args.join(", "));
        }
    }
    Ok(())
}

fn show_doc(keyword: &str) -> Result<()> {
    let library = ExcelLibrary::new();
    let doc = library
        .keyword_documentation(keyword)
        .with_context(|| format!("No documentation for '{}'", keyword))?;
    print!("{}", doc);
    if !doc.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read script from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script '{}'", path.display()))
    }
}

fn run_script(path: &Path) -> Result<()> {
    let text = read_script(path)?;
    let mut library = ExcelLibrary::new();

    for line in script::parse_script(&text) {
        log::debug!("line {}: {} {:?}", line.number, line.keyword, line.args);
        let value = library
            .run_keyword(&line.keyword, &line.args)
            .with_context(|| format!("Line {}: '{}' failed", line.number, line.keyword))?;

        match value {
            KeywordValue::None => {}
            KeywordValue::String(s) if s.is_empty() => {}
            other => println!("{}", other),
        }
    }
    Ok(())
}
