use anyhow::Result;
use clap::Parser;

use modpack_changelog::cli::{self, Cli};
use modpack_changelog::config::Config;
use modpack_changelog::{interactive, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::from_env()?;
    let command = match cli.command {
        Some(command) => command,
        None => interactive::prompt_command()?,
    };

    cli::execute(command, &config).await
}
