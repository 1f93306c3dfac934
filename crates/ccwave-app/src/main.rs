use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use ccwave_core::{CaptureFormat, CaptureReader, Session, Settings};
use clap::Parser;

/// Decode CC1101 register accesses from a logic-analyzer SPI export.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SPI transfer export (CSV or JSON lines)
    capture: PathBuf,

    /// Input format; guessed from the file extension when omitted
    #[arg(short, long)]
    format: Option<CaptureFormat>,

    /// Settings file (JSON); defaults to the user config dir when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gap that ends a transaction, in microseconds
    #[arg(long)]
    timeout_us: Option<f64>,

    /// Crystal oscillator frequency in MHz
    #[arg(long)]
    xosc_mhz: Option<f64>,

    /// Only show frames containing one of these keywords
    #[arg(short, long)]
    include: Vec<String>,

    /// Hide frames containing any of these keywords
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Omit the relative timestamp column
    #[arg(long)]
    no_timestamp: bool,

    /// Print one JSON object per frame
    #[arg(long)]
    json: bool,

    /// Maximum number of frames kept in memory
    #[arg(long, default_value_t = 1_000_000)]
    max_frames: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::builder()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let settings = load_settings(&args)?;
    let format = args.format.unwrap_or_else(|| {
        CaptureFormat::from_extension(args.capture.extension().and_then(|ext| ext.to_str()))
    });

    let file = File::open(&args.capture)
        .with_context(|| format!("opening {}", args.capture.display()))?;
    let mut session = Session::new(settings.resolve(), args.max_frames);
    session
        .log_mut()
        .set_filter(args.include.clone(), args.exclude.clone());

    for transfer in CaptureReader::new(BufReader::new(file), format) {
        let transfer = transfer.with_context(|| format!("reading {}", args.capture.display()))?;
        session.feed(&transfer);
    }
    session.finish();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        for entry in session.log().visible() {
            serde_json::to_writer(&mut out, &entry.frame)?;
            writeln!(out)?;
        }
    } else {
        out.write_all(session.log().to_text(!args.no_timestamp).as_bytes())?;
    }
    Ok(())
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default().context("loading default settings")?,
    };
    if let Some(us) = args.timeout_us {
        settings.packet_timeout_us = us;
    }
    if let Some(mhz) = args.xosc_mhz {
        settings.f_xosc_mhz = mhz;
    }
    log::debug!("settings: {settings:?}");
    Ok(settings)
}
