use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use chrono::Utc;
use clap::{Parser, ValueEnum};

use dataweb_core::api::convert::{ConvertContext, convert};
use dataweb_core::labels::{LabelTable, parse_label_override};
use dataweb_core::model::FeedSnapshot;
use dataweb_core::projector::StatusFeedProjector;
use dataweb_core::provider::{FeedProvider, FileProvider, ProviderError};
use dataweb_core::render::{PageOptions, render_page, render_text};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Html,
}

#[derive(Parser)]
#[command(
    name = "dataweb-dump",
    about = "Project one dashboard feed snapshot and print it",
    version = dataweb_core::VERSION
)]
struct Cli {
    /// Feed JSON file; `-` or absent reads stdin
    path: Option<PathBuf>,

    /// Fetch the feed from this URL instead of a file
    #[arg(long, conflicts_with = "path")]
    url: Option<String>,

    /// HTTP timeout in seconds (with --url)
    #[arg(long, default_value = "5")]
    timeout: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Instrument name for the heading
    #[arg(long, default_value = "DEMO")]
    instrument: String,

    /// Extra or replacement PV label, as KEY=Label (repeatable)
    #[arg(long = "label", value_name = "KEY=LABEL", value_parser = parse_label_override)]
    labels: Vec<(String, String)>,
}

fn main() {
    let cli = Cli::parse();

    let snapshot = match load_snapshot(&cli) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let projector =
        StatusFeedProjector::new(LabelTable::default().with_overrides(cli.labels.iter().cloned()));
    let dashboard = projector.project(&snapshot);
    let now = Utc::now();

    match cli.format {
        Format::Text => print!("{}", render_text(&dashboard, &cli.instrument)),
        Format::Html => print!(
            "{}",
            render_page(
                &dashboard,
                &PageOptions {
                    instrument: &cli.instrument,
                    refresh_secs: None,
                    updated_at: Some(now),
                },
            )
        ),
        Format::Json => {
            let api = convert(&ConvertContext {
                dashboard: &dashboard,
                instrument: &cli.instrument,
                timestamp: now.timestamp(),
            });
            match serde_json::to_string_pretty(&api) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("failed to serialize dashboard: {e}");
                    process::exit(1);
                }
            }
        }
    }
}

// ── Input ────────────────────────────────────────────────────────────────────

fn load_snapshot(cli: &Cli) -> Result<FeedSnapshot, ProviderError> {
    if let Some(url) = &cli.url {
        return fetch_url(url, cli.timeout);
    }
    match &cli.path {
        Some(path) if path.as_os_str() != "-" => FileProvider::new(path.clone()).fetch(),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| ProviderError::Io(format!("stdin: {e}")))?;
            Ok(FeedSnapshot::from_json(&text)?)
        }
    }
}

#[cfg(feature = "http")]
fn fetch_url(url: &str, timeout: u64) -> Result<FeedSnapshot, ProviderError> {
    use dataweb_core::provider::HttpProvider;
    HttpProvider::new(url, std::time::Duration::from_secs(timeout)).fetch()
}

#[cfg(not(feature = "http"))]
fn fetch_url(url: &str, _timeout: u64) -> Result<FeedSnapshot, ProviderError> {
    Err(ProviderError::Http(format!(
        "cannot fetch {url}: built without the `http` feature"
    )))
}
