use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};
use serde_json::{Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::session::Session;
use crate::cli::utils::{output_empty_collection, output_record, output_success, render_table};
use crate::cli::OutputFormat;

const LIST_COLUMNS: &[&str] = &["id", "name", "email", "phone", "company_name", "creator_name"];
const RECORD_KEYS: &[&str] = &[
    "id",
    "name",
    "email",
    "phone",
    "company_name",
    "creator_name",
    "created_at",
    "updated_at",
];

#[derive(Clone, Copy, ValueEnum)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    fn as_param(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }
}

#[derive(Args, Default)]
pub struct CustomerFields {
    #[arg(long, help = "Customer name")]
    pub name: Option<String>,
    #[arg(long, help = "Customer email")]
    pub email: Option<String>,
    #[arg(long, help = "Customer phone")]
    pub phone: Option<String>,
    #[arg(long = "company", help = "Company name")]
    pub company_name: Option<String>,
}

impl CustomerFields {
    /// Only the flags actually given, so updates stay partial
    fn to_body(&self) -> Value {
        let mut body = Map::new();
        for (key, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("company_name", &self.company_name),
        ] {
            if let Some(value) = value {
                body.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(body)
    }
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    #[command(about = "List customers you can see")]
    List {
        #[arg(long, help = "Case-insensitive match on name or email")]
        search: Option<String>,
        #[arg(long, help = "Exact company name")]
        company: Option<String>,
        #[arg(long, help = "Sort field: name, email, company_name, created_at")]
        sort_by: Option<String>,
        #[arg(long, help = "asc or desc")]
        sort_order: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },

    #[command(about = "Show one customer")]
    Show {
        #[arg(help = "Customer id")]
        id: String,
    },

    #[command(about = "Create a customer")]
    Create {
        #[command(flatten)]
        fields: CustomerFields,
    },

    #[command(about = "Update the given fields of a customer")]
    Update {
        #[arg(help = "Customer id")]
        id: String,
        #[command(flatten)]
        fields: CustomerFields,
    },

    #[command(about = "Delete a customer")]
    Delete {
        #[arg(help = "Customer id")]
        id: String,
    },

    #[command(about = "Import customers from a .csv or .xlsx file")]
    Import {
        #[arg(help = "Spreadsheet to upload")]
        file: PathBuf,
    },

    #[command(about = "Download customers as a spreadsheet")]
    Export {
        #[arg(long, value_enum, default_value = "xlsx")]
        format: FileFormat,
        #[arg(long, short, help = "Output path (defaults to the server's file name)")]
        output: Option<PathBuf>,
    },

    #[command(about = "Dashboard totals and top companies")]
    Summary,
}

pub async fn handle(cmd: CustomerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let session = Session::load()?;
    if session.current_actor().is_none() {
        anyhow::bail!(crate::cli::client::ClientError::NotLoggedIn);
    }
    let client = ApiClient::new(&session)?;

    match cmd {
        CustomerCommands::List {
            search,
            company,
            sort_by,
            sort_order,
            page,
            per_page,
        } => {
            let query: Vec<(&str, String)> = [
                ("search", search),
                ("company", company),
                ("sort_by", sort_by),
                ("sort_order", sort_order),
                ("page", page.map(|p| p.to_string())),
                ("per_page", per_page.map(|p| p.to_string())),
            ]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect();

            let body = client.get("customers", &query).await?;
            let page = &body["data"];
            let rows = page["data"].as_array().cloned().unwrap_or_default();

            match output_format {
                OutputFormat::Json => output_record(&output_format, page, &[]),
                OutputFormat::Text if rows.is_empty() => {
                    output_empty_collection(&output_format, "customers", "No customers found")
                }
                OutputFormat::Text => {
                    println!("{}", render_table(LIST_COLUMNS, &rows));
                    println!(
                        "\nPage {} of {} ({} total)",
                        page["current_page"], page["last_page"], page["total"]
                    );
                    Ok(())
                }
            }
        }
        CustomerCommands::Show { id } => {
            let body = client.get(&format!("customers/{}", id), &[]).await?;
            output_record(&output_format, &body["data"], RECORD_KEYS)
        }
        CustomerCommands::Create { fields } => {
            let body = client.post("customers", &fields.to_body()).await?;
            output_success(&output_format, &message_of(&body), body.get("data").cloned())
        }
        CustomerCommands::Update { id, fields } => {
            let changes = fields.to_body();
            if changes.as_object().map_or(true, Map::is_empty) {
                anyhow::bail!("Nothing to update, pass at least one of --name, --email, --phone, --company");
            }
            let body = client.put(&format!("customers/{}", id), &changes).await?;
            output_success(&output_format, &message_of(&body), body.get("data").cloned())
        }
        CustomerCommands::Delete { id } => {
            let body = client.delete(&format!("customers/{}", id)).await?;
            output_success(&output_format, &message_of(&body), None)
        }
        CustomerCommands::Import { file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("Import path has no file name")?;

            let body = client.upload("customers/process/import", file_name, bytes).await?;
            output_success(&output_format, &message_of(&body), body.get("data").cloned())
        }
        CustomerCommands::Export { format, output } => {
            let download = client
                .download(
                    "customers/process/export",
                    &[("format", format.as_param().to_string())],
                )
                .await?;
            let path = output.unwrap_or_else(|| {
                PathBuf::from(
                    download
                        .file_name
                        .clone()
                        .unwrap_or_else(|| format!("customers.{}", format.as_param())),
                )
            });
            std::fs::write(&path, &download.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            output_success(
                &output_format,
                &format!("Exported {} bytes to {}", download.bytes.len(), path.display()),
                Some(serde_json::json!({ "path": path.display().to_string() })),
            )
        }
        CustomerCommands::Summary => {
            let body = client.get("customers/dashboard/summary", &[]).await?;
            let summary = &body["data"];

            match output_format {
                OutputFormat::Json => output_record(&output_format, summary, &[]),
                OutputFormat::Text => {
                    println!("Total customers: {}", summary["total_customers"]);
                    println!("Added today:     {}", summary["customers_today"]);
                    let top = summary["top_companies"].as_array().cloned().unwrap_or_default();
                    if !top.is_empty() {
                        println!("\n{}", render_table(&["company_name", "total"], &top));
                    }
                    Ok(())
                }
            }
        }
    }
}

fn message_of(body: &Value) -> String {
    body["message"].as_str().unwrap_or("Done").to_string()
}
