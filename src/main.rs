use clap::Parser;
use color_eyre::Result;

use qwatch::cli::{run_cli_command, Cli};
use qwatch::logging;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);

    run_cli_command(cli).await
}
