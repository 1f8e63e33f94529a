use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use obmiar_core::codec::{BuildingCodec, LoggingCodec, SerdeJsonCodec};
use obmiar_core::{
    Config, ReportKind, ReportView, SelectedFile, UploadError, UploadEvent, dispatch_uploads,
};
use obmiar_reporting::{ExportFormat, export_view, render_fragment_text};
use owo_colors::OwoColorize;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use tokio_util::sync::CancellationToken;

/// Building report client - upload a building description and collect calculation reports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the building description file to upload
    file: Option<PathBuf>,

    /// Report to request (0/area, 1/volume, 2/luminosity); repeatable, defaults to all
    #[arg(short = 'r', long = "report", value_parser = parse_report_kind)]
    reports: Vec<ReportKind>,

    /// Root URL of the calculation server
    #[arg(long)]
    server: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the building structure instead of uploading
    #[arg(long)]
    show: bool,

    /// Write the collected report to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Export format for --output (text, html, json)
    #[arg(long, default_value = "text", value_parser = parse_export_format)]
    format: ExportFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log at debug level
    #[arg(long)]
    verbose: bool,
}

fn parse_report_kind(value: &str) -> Result<ReportKind, String> {
    value.parse::<ReportKind>().map_err(|err| err.to_string())
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_logger(args.verbose);

    if args.show {
        return show_building(args.file.clone());
    }

    // Resolve config from CLI flags > env vars > defaults
    let defaults = Config::default();
    let base_url = args
        .server
        .clone()
        .or_else(|| std::env::var("OBMIAR_SERVER").ok())
        .unwrap_or(defaults.base_url);
    let config = Config {
        base_url: base_url.trim_end_matches('/').to_string(),
        timeout_secs: args.timeout_secs,
    };

    let file = match args.file.as_deref() {
        Some(path) => Some(SelectedFile::from_path(path)?),
        None => None,
    };

    let kinds: Vec<ReportKind> = if args.reports.is_empty() {
        ReportKind::ALL.to_vec()
    } else {
        args.reports.clone()
    };

    let mut view = ReportView::new();
    let no_color = args.no_color;
    let progress = move |event: UploadEvent| match event {
        UploadEvent::Dispatched { kind, index, total } => {
            log::info!("dispatching {}/{}: POST {}", index + 1, total, kind.endpoint());
        }
        UploadEvent::Settled { fragment } => {
            let text = render_fragment_text(&fragment);
            if fragment.is_failure() && !no_color {
                println!("{}\n", text.red());
            } else {
                println!("{text}\n");
            }
        }
    };

    let stats = match dispatch_uploads(
        file,
        &kinds,
        &config,
        &mut view,
        progress,
        CancellationToken::new(),
    )
    .await
    {
        Ok(stats) => stats,
        Err(UploadError::NoFile) => {
            eprintln!("Wybierz plik!");
            std::process::exit(2);
        }
        Err(err) => return Err(err.into()),
    };

    log::info!(
        "{} requested, {} succeeded, {} failed",
        stats.requested,
        stats.succeeded,
        stats.failed
    );

    if let Some(path) = &args.output {
        std::fs::write(path, export_view(&view, args.format))?;
        println!("Report written to {}", path.display());
    }

    if stats.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn show_building(path: Option<PathBuf>) -> anyhow::Result<()> {
    let Some(path) = path else {
        eprintln!("Wybierz plik!");
        std::process::exit(2);
    };

    let codec = LoggingCodec::new(SerdeJsonCodec);
    let building = codec.read_file(&path)?;
    if building.building.is_none() {
        anyhow::bail!("{} does not contain a building description", path.display());
    }
    for line in building.outline() {
        println!("{line}");
    }
    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
