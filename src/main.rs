//! ERP gateway command-line client
//!
//! ```bash
//! erp-client --tenant TEN-KE-26-ABCDE request GET /purchases/orders
//! erp-client --location /w/acme/sales route /sales/invoices
//! erp-client login "$TOKEN"
//! erp-client status
//! ```

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use erp_gateway_client::{
    domain::{ApiRequest, Tenant},
    jwt::decode_claims,
    session::{is_token_valid, FileTokenStore, StaticContext, TokenStore},
    telemetry, ApiClient, Config,
};
use reqwest::Method;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "erp-client")]
#[command(version)]
#[command(about = "Tenant-scoped ERP API client", long_about = None)]
struct Cli {
    /// Selected tenant (UUID or tenant code)
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Current navigation path, e.g. /w/acme/purchases
    #[arg(long, global = true)]
    location: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request through the pipeline and print the JSON response
    Request {
        #[arg(value_parser = parse_method)]
        method: Method,
        path: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
    },
    /// Show where a path would be sent without sending it
    Route { path: String },
    /// Store an access token
    Login { token: String },
    /// Clear the stored access token
    Logout,
    /// Report whether the stored token is usable
    Status,
}

fn parse_method(value: &str) -> std::result::Result<Method, String> {
    Method::from_bytes(value.to_uppercase().as_bytes())
        .map_err(|_| format!("Invalid HTTP method: {}", value))
}

fn build_context(cli: &Cli) -> StaticContext {
    let mut context = StaticContext::new();
    if let Some(tenant) = &cli.tenant {
        context = context.with_selected_tenant(Tenant::new(tenant.clone()));
    }
    if let Some(location) = &cli.location {
        context = context.with_current_path(location.clone());
    }
    context
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    telemetry::init(&config.telemetry);

    let cli = Cli::parse();
    let tokens = Arc::new(FileTokenStore::new(config.session.token_file.clone()));

    match &cli.command {
        Commands::Login { token } => {
            decode_claims(token).context("Refusing to store an unreadable token")?;
            tokens.save(token)?;
            info!(path = %tokens.path().display(), "Token stored");
        }
        Commands::Logout => {
            tokens.clear()?;
            info!(path = %tokens.path().display(), "Token cleared");
        }
        Commands::Status => {
            let token = tokens.load();
            if !is_token_valid(tokens.as_ref()) {
                println!("Not authenticated");
                return Ok(());
            }
            let claims = decode_claims(token.as_deref().unwrap_or_default())?;
            println!("Authenticated");
            if let Some(sub) = &claims.sub {
                println!("  subject: {}", sub);
            }
            if let Some(exp) = claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()) {
                println!("  expires: {}", exp.to_rfc3339());
            }
        }
        Commands::Route { path } => {
            let context = build_context(&cli);
            let client = ApiClient::new(config, Arc::new(context), tokens)?;
            let preview = client.preview(path);
            match &preview.tenant {
                Some(tenant) => println!("tenant:  {} ({})", tenant.id, tenant.source),
                None => println!("tenant:  -"),
            }
            println!("path:    {}", preview.path);
            println!("url:     {}", preview.url);
            println!("header:  {}", preview.tenant_header);
        }
        Commands::Request { method, path, data } => {
            let context = build_context(&cli);
            let client = ApiClient::new(config, Arc::new(context), tokens)?;

            let mut request = ApiRequest::new(method.clone(), path.clone());
            if let Some(data) = data {
                let body: serde_json::Value =
                    serde_json::from_str(data).context("--data must be valid JSON")?;
                request = request.with_json(&body)?;
            }

            let value = client.send(request).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
