use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::session::Session;
use crate::cli::utils::{output_record, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server (logs out of the previous one)")]
    Use {
        #[arg(help = "Server base URL, e.g. http://localhost:8000")]
        url: String,
    },

    #[command(about = "Show the currently selected server")]
    Current,

    #[command(about = "Show server information from API root endpoint")]
    Info,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut session = Session::load()?;

    match cmd {
        ServerCommands::Use { url } => {
            let candidate = Session {
                server_url: url.trim_end_matches('/').to_string(),
                ..Session::default()
            };
            // Reject unparsable URLs before they are saved
            ApiClient::new(&candidate)?;

            session.logout();
            session.server_url = candidate.server_url;
            session.save()?;
            output_success(
                &output_format,
                &format!("Using server {}", session.server_url),
                Some(json!({ "server_url": session.server_url })),
            )
        }
        ServerCommands::Current => {
            let record = json!({
                "server_url": session.server_url,
                "email": session.current_actor().map(|a| a.email.clone()),
                "logged_in_at": session.logged_in_at,
            });
            output_record(&output_format, &record, &["server_url", "email", "logged_in_at"])
        }
        ServerCommands::Info => {
            let body = ApiClient::new(&session)?.get("", &[]).await?;
            output_record(&output_format, &body["data"], &["name", "version"])
        }
        ServerCommands::Health => {
            let (status, body) = ApiClient::new(&session)?.health().await?;
            if !status.is_success() {
                anyhow::bail!(
                    "{} is unhealthy ({}): {}",
                    session.server_url,
                    status,
                    body["message"].as_str().unwrap_or("no details")
                );
            }
            output_record(&output_format, &body["data"], &["status", "database", "timestamp"])
        }
    }
}
