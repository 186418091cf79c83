pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "atrium")]
#[command(about = "Atrium CLI - Command-line interface for the CRM API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "API server URL (defaults to ATRIUM_SERVER_URL or http://localhost:3000)"
    )]
    pub server: Option<String>,

    #[arg(long, global = true, help = "JWT token (defaults to ATRIUM_TOKEN)")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Server status and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Tenant administration (requires a super admin token)")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = utils::ApiClient::new(cli.server.clone(), cli.token.clone())?;

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, &client, output_format).await,
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, &client, output_format).await,
    }
}
