use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use townmap::config::{AppConfig, OutputFormat};
use townmap::{data, legend, process_markers, server, Ingestion, MapMode};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, measure and colorize every town in the marker feed
    Process {
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Serve processed towns, point queries and legends over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the legend of one map mode as JSON
    Legend {
        #[arg(short, long)]
        mode: MapMode,
        /// Marker feed, needed for the founded date range
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

fn ingest(config: &AppConfig, input: Option<&Path>) -> anyhow::Result<Ingestion> {
    let path = input.unwrap_or(config.input.markers.as_path());
    let markers = data::load_markers(path, &config.input.layer_id)?;
    Ok(process_markers(&markers, &config.palette))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Process { input, output, format } => {
            let ingestion = ingest(&config, input.as_deref())?;
            let path = output.unwrap_or_else(|| config.output.path.clone());
            let format = format.unwrap_or(config.output.format);
            data::write_records(&path, format, &ingestion.records)?;
        }
        Commands::Serve { input, port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let ingestion = ingest(&config, input.as_deref())?;
            server::start_server(&config, ingestion).await?;
        }
        Commands::Legend { mode, input } => {
            let dates = if mode == MapMode::Founded {
                ingest(&config, input.as_deref())?.stats.dates
            } else {
                None
            };
            let entries = legend::legend(mode, &config.palette, dates);
            let json = serde_json::to_string_pretty(&entries).context("Failed to encode legend")?;
            println!("{json}");
        }
    }

    Ok(())
}
