use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::commands::password_or_prompt;
use crate::cli::session::{Session, SessionActor};
use crate::cli::utils::{output_record, output_success};
use crate::cli::OutputFormat;

const ACTOR_KEYS: &[&str] = &["id", "name", "email", "role", "created_at"];

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Register a new account and log in as it")]
    Register {
        #[arg(help = "Display name")]
        name: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Revoke the current token and forget it")]
    Logout,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut session = Session::load()?;
    let client = ApiClient::new(&session)?;

    match cmd {
        AuthCommands::Register { name, email, password } => {
            let password = password_or_prompt(password, "Password")?;
            let body = client
                .post(
                    "register",
                    &json!({
                        "name": name,
                        "email": email,
                        "password": password,
                        "password_confirmation": password,
                    }),
                )
                .await?;
            remember(&mut session, &body)?;
            output_success(&output_format, &signed_in_message(&body, "Registered"), body.get("data").cloned())
        }
        AuthCommands::Login { email, password } => {
            let password = password_or_prompt(password, "Password")?;
            let body = client
                .post("login", &json!({ "email": email, "password": password }))
                .await?;
            remember(&mut session, &body)?;
            output_success(&output_format, &signed_in_message(&body, "Logged in"), body.get("data").cloned())
        }
        AuthCommands::Logout => {
            if session.token.is_none() {
                return output_success(&output_format, "Not logged in", None);
            }
            // A token the server already revoked still gets forgotten locally
            let outcome = client.post("logout", &json!({})).await;
            session.logout();
            session.save()?;
            outcome?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => {
            if session.current_actor().is_none() {
                anyhow::bail!(crate::cli::client::ClientError::NotLoggedIn);
            }
            let body = client.get("me", &[]).await?;
            output_record(&output_format, &body["data"], ACTOR_KEYS)
        }
    }
}

fn remember(session: &mut Session, body: &Value) -> anyhow::Result<()> {
    let token = body["data"]["token"]
        .as_str()
        .context("Server response did not include a token")?
        .to_string();
    let actor: SessionActor = serde_json::from_value(body["data"]["user"].clone())
        .context("Server response did not include the user")?;

    session.login(actor, token);
    session.save()
}

fn signed_in_message(body: &Value, verb: &str) -> String {
    format!(
        "{} as {} ({})",
        verb,
        body["data"]["user"]["name"].as_str().unwrap_or_default(),
        body["data"]["user"]["email"].as_str().unwrap_or_default()
    )
}
