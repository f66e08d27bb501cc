use anyhow::Result;
use clap::Parser;
use sheetpress::{
    config::Settings, response::ApiResponse, Conversion, ConvertError, Converter,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Convert a spreadsheet into a zipped CSV of its populated cells.
#[derive(Parser, Debug)]
struct Args {
    /// Spreadsheet to convert (xlsx, xls, xlsm, xlsb or ods)
    input: PathBuf,

    /// Directory for the finished archive; defaults to the configured upload dir
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Include the full error cause chain in the JSON output
    #[arg(long)]
    details: bool,
}

fn run(args: &Args, out_dir: PathBuf) -> Result<Conversion, ConvertError> {
    let converter = Converter::new(out_dir)?;
    let input = converter.stage_file(&args.input)?;
    converter.convert(input)
}

fn main() -> Result<ExitCode> {
    let settings = Settings::load()?;

    // ─── logging goes to stderr; stdout carries the JSON result ──────
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(settings.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| settings.upload_dir.clone());

    let outcome = run(&args, out_dir);
    let response = match &outcome {
        Ok(conversion) => {
            info!(archive = %conversion.archive_path.display(), "done");
            ApiResponse::converted(conversion)
        }
        Err(err) => {
            error!(kind = err.kind(), "{}", err.details());
            ApiResponse::failed(err, args.details || settings.expose_error_details)
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
