//! CLI entry point for toolloop.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::callbacks::{CallbackManager, StreamWriterHandler, TracingHandler, UsageHandler};

/// Tool-calling agent CLI
#[derive(Parser, Debug)]
#[command(name = "toolloop", version, about = "Run a function-calling agent from the terminal")]
pub struct Cli {
    /// Config file (defaults to ~/.toolloop/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log agent lifecycle events
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the agent a question
    Ask(AskArgs),
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Model id
    #[arg(short, long, default_value = "gpt-3.5-turbo")]
    pub model: String,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Planning calls allowed before giving up
    #[arg(long, default_value_t = 5)]
    pub max_iterations: usize,

    /// Print tokens as they arrive
    #[arg(long)]
    pub stream: bool,

    /// Print token usage and cost after the run
    #[arg(long)]
    pub usage: bool,

    /// The question
    pub prompt: String,
}

/// Handlers for an `ask` run.
///
/// A usage handler is attached only when `--usage` is set. It is lenient, so a
/// model without a known price never fails the run.
pub fn ask_callbacks(args: &AskArgs, verbose: bool) -> (CallbackManager, Option<UsageHandler>) {
    let mut callbacks = CallbackManager::default();
    let usage = args.usage.then(UsageHandler::lenient);
    if let Some(usage) = &usage {
        callbacks = callbacks.with_handler(Arc::new(usage.clone()));
    }
    if args.stream {
        callbacks = callbacks.with_handler(Arc::new(StreamWriterHandler::stdout()));
    }
    if verbose {
        callbacks = callbacks.with_handler(Arc::new(TracingHandler));
    }
    (callbacks, usage)
}
