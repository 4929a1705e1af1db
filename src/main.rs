mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use fittrack::client::{ApiClient, ProgressCallback, RequestOptions, UploadFile};
use fittrack::config::Config;
use fittrack::logger::DiagnosticLogger;
use fittrack::observability::init_tracing;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };
    init_tracing(&config.mode);

    let logger = DiagnosticLogger::from_config(&config)?;
    let client = ApiClient::from_config(&config, logger.clone())?;
    info!(base_url = client.base_url(), "Client ready");

    let outcome = run(&client, cli.command).await;

    if cli.export_logs {
        eprintln!("{}", logger.export_logs()?);
    }

    outcome
}

async fn run(
    client: &ApiClient,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match command {
        Commands::Health => {
            let healthy = client.health_check().await;
            println!("{}", if healthy { "healthy" } else { "unreachable" });
            if !healthy {
                return Err("health check failed".into());
            }
        }
        Commands::Get(args) => {
            let options = RequestOptions::builder().query(args.query).build();
            let body: serde_json::Value = client.get(&args.path, options).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Upload(args) => {
            let file = UploadFile::from_path(&args.file).await?;
            let progress: ProgressCallback = Arc::new(|percent: u8| eprint!("\rUploading... {percent:>3}%"));
            let body: serde_json::Value = client
                .upload_file(&args.path, file, Some(progress))
                .await?;
            eprintln!();
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
