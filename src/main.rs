mod bitbucket;
mod branch;
mod classify;
mod cli;
mod config;
mod credentials;
mod env;
mod error;
mod guard;
mod observer;
mod output;
mod run;
mod run_console;
#[cfg(test)]
mod test_support;
mod verbs;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ubuild - Unbreakable Build Notifier");
    cli.execute().await?;

    Ok(())
}
