use std::path::PathBuf;

use asset_ingest::{IngestConfig, UploadRequest, setup_pipeline};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to ingest
    file: PathBuf,

    /// Display name for the asset (defaults to the file name)
    #[arg(short, long)]
    name: Option<String>,

    /// Content type (detected from the payload when omitted)
    #[arg(short, long)]
    content_type: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = IngestConfig::from_env();
    info!(
        "🚀 Ingesting {} (max size: {}MB)",
        args.file.display(),
        config.max_file_size / 1024 / 1024
    );

    let payload = tokio::fs::read(&args.file).await?;
    let content_type = args
        .content_type
        .or_else(|| infer::get(&payload).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
    let name = args.name.unwrap_or_else(|| {
        args.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    });

    let pipeline = setup_pipeline(config)?;
    let result = pipeline
        .ingest(UploadRequest::new(payload, name, content_type))
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.is_success() {
        error!("Ingestion failed");
        std::process::exit(1);
    }
    Ok(())
}
