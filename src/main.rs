use anyhow::Result;
use clap::Parser;

mod api;
mod cache;
mod cli;
mod controller;
mod theme;
mod tui;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(cli::Commands::Tui) {
        cli::Commands::List => {
            cli::handle_list().await?;
        }
        cli::Commands::Add { title } => {
            cli::handle_add(title).await?;
        }
        cli::Commands::Toggle { id } => {
            cli::handle_toggle(id).await?;
        }
        cli::Commands::Remove { id } => {
            cli::handle_remove(id).await?;
        }
        cli::Commands::Clear => {
            cli::handle_clear().await?;
        }
        cli::Commands::Status => {
            cli::handle_status().await?;
        }
        cli::Commands::Tui => {
            cli::handle_tui().await?;
        }
    }

    Ok(())
}
