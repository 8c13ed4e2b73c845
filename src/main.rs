//! deferred-expr - encode, decode and evaluate lazy expressions

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use deferred_expr::{
    decode_context, encode, parse_expression, Decoder, ExpressionEvaluator, Map,
};
use std::path::{Path, PathBuf};

/// Encode, decode and evaluate lazy expressions
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode constructor syntax, e.g. "Not(Eval('x', 0))", as canonical JSON
    Encode {
        expression: String,
    },

    /// Decode canonical JSON and print the result in constructor syntax
    Decode {
        text: String,

        #[command(flatten)]
        context: ContextArgs,

        /// Rebuild expressions instead of evaluating them
        #[arg(long)]
        noeval: bool,
    },

    /// Evaluate constructor syntax against a context
    Eval {
        expression: String,

        #[command(flatten)]
        context: ContextArgs,
    },
}

#[derive(clap::Args, Debug, Default)]
struct ContextArgs {
    /// JSON file holding the context mapping
    #[arg(short, long, conflicts_with = "context_json")]
    context: Option<PathBuf>,

    /// Context mapping given inline as JSON
    #[arg(long)]
    context_json: Option<String>,
}

impl ContextArgs {
    fn load(&self) -> Result<Map> {
        match (&self.context, &self.context_json) {
            (Some(path), _) => read_context(path),
            (None, Some(text)) => decode_context(text).context("Failed to parse inline context"),
            (None, None) => Ok(Map::new()),
        }
    }
}

fn read_context(path: &Path) -> Result<Map> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file {}", path.display()))?;
    decode_context(&text)
        .with_context(|| format!("Failed to parse context file {}", path.display()))
}

fn run(command: Command) -> Result<String> {
    match command {
        Command::Encode { expression } => {
            let value = parse_expression(&expression)?;
            Ok(encode(&value)?)
        }
        Command::Decode {
            text,
            context,
            noeval,
        } => {
            let context = context.load()?;
            let value = Decoder::new(&context).with_noeval(noeval).decode(&text)?;
            Ok(value.to_string())
        }
        Command::Eval {
            expression,
            context,
        } => {
            let context = context.load()?;
            let value = parse_expression(&expression)?;
            Ok(ExpressionEvaluator::new(&context)
                .evaluate_value(&value)
                .to_string())
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let output = run(args.command)?;
    println!("{}", output);
    Ok(())
}
