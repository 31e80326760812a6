//! CLI module for Tourguide
//!
//! Provides interactive commands:
//! - `chat`: Conversation with the assistant over stdin
//! - `tools`: Print the tool catalog offered to the model

use clap::{Parser, Subcommand};

pub mod chat;

/// Tourguide travel assistant CLI
#[derive(Parser, Debug)]
#[command(name = "tourguide")]
#[command(about = "Conversational tour-booking assistant")]
#[command(version)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with the assistant
    Chat {
        /// Print the answer as it is generated
        #[arg(long)]
        stream: bool,
    },
    /// Print the tool catalog as JSON
    Tools,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Chat { stream }) => chat::run(stream).await,
        Some(Commands::Tools) => print_tools(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn print_tools() -> anyhow::Result<()> {
    let config = crate::config::load_config()?;
    let specs = tourguide_tools::tool_specs(config.orchestrator_config().web_search.as_deref());
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}
