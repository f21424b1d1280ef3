use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use linkpulse_common::Config;
use linkpulse_scan::pipeline::{LogSink, Scanner};
use linkpulse_scan::report::{write_csv, Report};
use linkpulse_scan::resolve::{client_from_config, CancelToken};

#[derive(Parser, Debug)]
#[command(
    name = "linkpulse",
    about = "Extract, classify and analyze archived URLs from pasted text",
    version
)]
struct Args {
    /// Read input text from a file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Limit the per-URL listing to archived URLs
    #[arg(long)]
    archive_only: bool,

    /// Write per-URL rows to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Override the archive metadata service base URL
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("linkpulse_scan=info".parse()?)
                .add_directive("archive_meta_client=warn".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }

    let input = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    let client = client_from_config(&config);
    if !client.health().await {
        warn!(
            api_url = config.api_base_url.as_str(),
            "archive metadata service unreachable; archived URLs will stay unresolved"
        );
    }

    let scanner = Scanner::new(Arc::new(client), Arc::new(LogSink), config.batch_size);
    let cancel = CancelToken::new();

    let result = match scanner.analyze(&input, &cancel).await {
        Ok(result) => result,
        Err(failure) => {
            // Whatever completed before the failure is still worth noting.
            if let Some(extracted) = &failure.context.extracted {
                info!(
                    distinct = extracted.urls.len(),
                    "partial results: extraction had completed"
                );
            }
            return Err(failure.into());
        }
    };

    info!(run_id = result.run_id.as_str(), "scan complete");
    print!("{}", Report::new(&result, args.archive_only));

    if let Some(path) = &args.csv {
        let mut file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_csv(&result, &mut file)?;
        info!(path = %path.display(), rows = result.classified.len(), "csv written");
    }

    Ok(())
}
