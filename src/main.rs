use clap::Parser;
use lode::config::ImportConfig;
use lode::events::{ImportEvent, ReportLevel};
use lode::host::HttpHost;
use lode::import::{ImportService, BUNDLE_MARKER};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Batch-import `main_assets` bundles into the host library.
#[derive(Parser, Debug)]
#[command(name = "lode", version, about)]
struct Args {
    /// Root directory to scan; opens a folder picker when omitted.
    root: Option<PathBuf>,

    /// Comma-separated destination folder list passed to the host.
    #[arg(long, default_value = "")]
    folders: String,

    /// Host API base URL (overrides LODE_API_URL).
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let args = Args::parse();

    let mut config = ImportConfig::load();
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    let root = match args.root {
        Some(root) => root,
        None => select_root().await.ok_or("no root directory selected")?,
    };
    let folders = parse_folders(&args.folders);

    let host = Arc::new(HttpHost::new(&config.api_base_url)?);
    let handle = ImportService::start(host, config);
    let mut events = handle.subscribe();

    handle.start_batch(root, folders)?;

    while let Some(event) = events.recv().await {
        match event {
            ImportEvent::Status { message, level } => {
                println!("{}{message}\x1b[0m", level_color(level));
            }
            ImportEvent::Progress { current, total } => {
                println!("progress: {current}/{total}");
            }
            ImportEvent::Log {
                timestamp,
                message,
                level,
            } => {
                println!(
                    "{}[{}] {message}\x1b[0m",
                    level_color(level),
                    timestamp.format("%H:%M:%S")
                );
            }
            ImportEvent::Finished { summary } => {
                println!(
                    "done: {} found, {} imported, {} cleaned, {} failed",
                    summary.total, summary.imported, summary.cleaned, summary.failed
                );
                break;
            }
        }
    }

    handle.shutdown();
    Ok(())
}

/// Native open-directory dialog for picking the import root.
async fn select_root() -> Option<PathBuf> {
    let title = format!("Select the folder containing {BUNDLE_MARKER} bundles");
    rfd::AsyncFileDialog::new()
        .set_title(&title)
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Comma-separated folder list, trimmed, empty entries dropped.
fn parse_folders(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|folder| !folder.is_empty())
        .map(str::to_string)
        .collect()
}

fn level_color(level: ReportLevel) -> &'static str {
    match level {
        ReportLevel::Info => "",
        ReportLevel::Warning => "\x1b[33m",
        ReportLevel::Error => "\x1b[31m",
    }
}
