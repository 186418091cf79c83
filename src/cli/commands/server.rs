use clap::Subcommand;

use crate::cli::utils::{output_data, ApiClient};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Show server information from the API root endpoint")]
    Info,

    #[command(about = "Check server health, including database connectivity")]
    Health,
}

pub async fn handle(
    cmd: ServerCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Info => {
            let payload = client.get("/").await?;
            output_data(output_format, &payload)
        }
        ServerCommands::Health => {
            let payload = client.get("/health").await?;
            output_data(output_format, &payload)
        }
    }
}
