use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_data, output_success, ApiClient};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants")]
    List,

    #[command(about = "Provision a tenant with a bootstrap admin")]
    Create {
        #[arg(help = "Tenant name")]
        name: String,
        #[arg(long, help = "Plan tier: free, team, business, enterprise")]
        plan: Option<String>,
        #[arg(long, help = "Bootstrap admin email")]
        admin_email: String,
        #[arg(long, help = "Bootstrap admin name")]
        admin_name: String,
        #[arg(long, help = "Bootstrap admin password")]
        admin_password: String,
    },

    #[command(about = "Show a tenant with its usage counters")]
    Show {
        #[arg(help = "Tenant ID")]
        id: Uuid,
    },

    #[command(about = "Move a tenant to a new plan")]
    Plan {
        #[arg(help = "Tenant ID")]
        id: Uuid,
        #[arg(help = "Plan tier: free, team, business, enterprise")]
        plan: String,
    },

    #[command(about = "Suspend a tenant; all its requests are denied")]
    Suspend {
        #[arg(help = "Tenant ID")]
        id: Uuid,
    },

    #[command(about = "Restore a suspended tenant")]
    Restore {
        #[arg(help = "Tenant ID")]
        id: Uuid,
    },
}

pub async fn handle(
    cmd: TenantCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::List => {
            let payload = client.get("/api/root/tenants").await?;
            output_data(output_format, &payload)
        }
        TenantCommands::Create {
            name,
            plan,
            admin_email,
            admin_name,
            admin_password,
        } => {
            let payload = client
                .post(
                    "/api/root/tenants",
                    json!({
                        "name": name,
                        "plan": plan,
                        "admin_email": admin_email,
                        "admin_name": admin_name,
                        "admin_password": admin_password,
                    }),
                )
                .await?;
            output_data(output_format, &payload)
        }
        TenantCommands::Show { id } => {
            let payload = client.get(&format!("/api/root/tenants/{}", id)).await?;
            output_data(output_format, &payload)
        }
        TenantCommands::Plan { id, plan } => {
            let payload = client
                .put(
                    &format!("/api/root/tenants/{}/plan", id),
                    json!({ "plan": plan }),
                )
                .await?;
            output_data(output_format, &payload)
        }
        TenantCommands::Suspend { id } => {
            client
                .post(&format!("/api/root/tenants/{}/suspend", id), json!({}))
                .await?;
            output_success(output_format, "Tenant suspended")
        }
        TenantCommands::Restore { id } => {
            client
                .post(&format!("/api/root/tenants/{}/restore", id), json!({}))
                .await?;
            output_success(output_format, "Tenant restored")
        }
    }
}
