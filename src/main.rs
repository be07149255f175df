use clap::Parser;
use quizhub_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve(Default::default())) {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::Cache(args) => cli::cache::run(args).await,
    }
}
