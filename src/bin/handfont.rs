//! Command-line front end: turn a letter-grid page into a TrueType font.
//!
//! # Usage
//!
//! ```bash
//! handfont letters.png -o handwriting.ttf \
//!     --config sheet.json \
//!     --artifacts out/glyphs \
//!     --report out/report.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use handfont::core::FontError;
use handfont::pipeline::{FontPipeline, PipelineConfig};
use handfont::utils::init_tracing_with_default;
use tracing::{error, info};

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "handfont", version)]
#[command(about = "Turn a scanned grid of handwritten letters into a TrueType font")]
struct Args {
    /// Page image with the handwritten letter grid.
    image: PathBuf,

    /// Where to write the compiled font.
    #[arg(short, long, default_value = "font.ttf")]
    output: PathBuf,

    /// JSON configuration file. Missing sections use the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for per-glyph PNG/SVG files and the manifest.
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Where to write the JSON run report.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Overrides the font family name.
    #[arg(long)]
    family: Option<String>,

    /// Log per-stage and per-glyph details.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing_with_default(if args.verbose { "handfont=debug" } else { "handfont=info" });

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), FontError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(family) = args.family {
        config.font.family_name = family;
    }

    let pipeline = FontPipeline::new(config)?;
    let output = pipeline.run_path(&args.image)?;

    output.font.write_to(&args.output)?;
    if let Some(path) = &args.report {
        std::fs::write(path, output.report.to_json()?)?;
        info!(path = %path.display(), "report written");
    }
    if let Some(dir) = &args.artifacts {
        output.write_artifacts(dir)?;
    }

    println!("{}", output.report);
    Ok(())
}

/// Error message with its source chain.
fn describe(error: &FontError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
