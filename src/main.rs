//! toolloop CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use toolloop::agent::{ExecutorConfig, FunctionsAgent, FunctionsAgentConfig};
use toolloop::cli::{ask_callbacks, AskArgs, Cli, Commands};
use toolloop::config::ClientConfig;
use toolloop::model::{ChatModelConfig, OpenAiChatModel};
use toolloop::tools::ToolRegistry;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Ask(args) => handle_ask(args, cli.config, cli.verbose).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_ask(
    args: AskArgs,
    config_path: Option<std::path::PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = ClientConfig::load(config_path.as_deref())?;
    let (callbacks, usage) = ask_callbacks(&args, verbose);

    let model_config = ChatModelConfig::builder()
        .model_name(args.model)
        .maybe_temperature(args.temperature)
        .stream(args.stream)
        .build();
    let model = OpenAiChatModel::from_client_config(&client, model_config)?;

    let mut agent_config = FunctionsAgentConfig::default();
    if let Some(system) = args.system {
        agent_config.system_message = system;
    }
    let executor_config = ExecutorConfig {
        max_iterations: args.max_iterations,
        ..Default::default()
    };

    let executor = FunctionsAgent::executor(
        Arc::new(model),
        ToolRegistry::new(),
        agent_config,
        executor_config,
    )?
    .with_callbacks(callbacks);

    let cancel = tokio_util::sync::CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let answer = executor.run_with_cancel(args.prompt, cancel).await;
    ctrl_c.abort();
    let answer = answer?;

    if args.stream {
        println!(); // newline after streaming
    } else {
        println!("{answer}");
    }
    if let Some(usage) = usage {
        eprintln!("{}", usage.report());
    }

    Ok(())
}
