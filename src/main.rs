use std::{path::PathBuf, process};

use clap::Parser;
use fbx2vrma::{
    convert::ConversionReport,
    logging::{LogLevel, init_logging},
    pipeline::{convert_directory, convert_file, resolve_output_path},
    settings::{ConverterSettings, load_settings, save_settings},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "fbx2vrma")]
#[command(about = "Convert FBX to VRMA with animation timing recalculated from keyframes")]
#[command(version)]
struct Cli {
    /// Input FBX/glTF file, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output VRMA file or directory (default: next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to the FBX2glTF binary
    #[arg(long = "fbx2gltf")]
    fbx2gltf: Option<PathBuf>,

    /// Animation framerate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    framerate: Option<u32>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to this JSON file before converting
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log verbosity (RUST_LOG overrides)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("Conversion failed: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => ConverterSettings::default(),
    };
    settings.apply_overrides(cli.framerate, cli.fbx2gltf.as_deref());
    let mut options = settings.to_options()?;
    if let Some(decoder) = cli.fbx2gltf {
        options.decoder_path = decoder;
    }
    if let Some(path) = &cli.save_config {
        save_settings(path, &settings)?;
        info!("Saved settings to {}", path.display());
    }
    let output = cli.output.or_else(|| settings.output_dir.map(PathBuf::from));

    if cli.input.is_dir() {
        let output_dir = output.unwrap_or_else(|| cli.input.clone());
        let report = convert_directory(&cli.input, &output_dir, &options)?;
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.input.display(), failure.message);
        }
        println!(
            "Batch complete: {}/{} succeeded.",
            report.converted.len(),
            report.total
        );
        return Ok(report.all_succeeded());
    }

    let output_path = resolve_output_path(&cli.input, output.as_deref());
    let report = convert_file(&cli.input, &output_path, &options)?;
    print_report(&output_path, &report);
    Ok(true)
}

fn print_report(output_path: &std::path::Path, report: &ConversionReport) {
    println!("Output: {}", output_path.display());
    println!(
        "Animations: {}, Humanoid bones: {}, Removed channels: {}",
        report.animation_count, report.human_bone_count, report.removed_channel_count
    );
    println!(
        "Duration: {:.3}s ({} frames @ {} fps)",
        report.duration_sec, report.frame_count, report.framerate
    );
    println!(
        "Size: {} bytes (JSON: {}, BIN: {})",
        report.total_bytes, report.json_chunk_bytes, report.bin_chunk_bytes
    );
}
