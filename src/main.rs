use clap::Parser;
use identity_session::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli::session::run(cli.command).await
}
