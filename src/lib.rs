//! toolloop: a tool-calling agent loop over chat models.
//!
//! A [`FunctionsAgent`](agent::FunctionsAgent) asks a function-calling chat
//! model what to do next; an [`Executor`](agent::Executor) runs the chosen
//! tools and feeds their observations back until the model answers or the
//! iteration limit is hit.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use toolloop::prelude::*;
//!
//! # async fn example() -> toolloop::error::Result<()> {
//! let client = ClientConfig::from_env();
//! let model = OpenAiChatModel::from_client_config(&client, ChatModelConfig::default())?;
//!
//! let mut tools = ToolRegistry::new();
//! tools.register(Arc::new(FnTool::text("echo", "Repeat the input", |text, _ctx| async move {
//!     Ok(text)
//! })))?;
//!
//! let executor = FunctionsAgent::executor(
//!     Arc::new(model),
//!     tools,
//!     FunctionsAgentConfig::default(),
//!     ExecutorConfig::default(),
//! )?;
//! let answer = executor.run("Echo 'hello'").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod prelude;
pub mod prompt;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
