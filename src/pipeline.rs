use std::{
    fs,
    path::{MAIN_SEPARATOR, Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::{
    convert::{ConversionReport, ConvertOptions, convert_with_report, embed_buffers},
    decoder::Decoder,
};

/// Extension written for converted animations.
pub const VRMA_EXTENSION: &str = "vrma";

/// Input extensions picked up by directory conversion.
const BATCH_INPUT_EXTENSIONS: [&str; 2] = ["fbx", "gltf"];

/// Per-run outcome of a directory conversion.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub converted: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub message: String,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.converted.len() == self.total
    }
}

/// Convert one FBX (or already decoded `.gltf`) file into a `.vrma` file.
///
/// FBX input is decoded into a temporary directory that is removed when this
/// function returns, whether or not the conversion succeeded.
pub fn convert_file(
    input_path: &Path,
    output_path: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    if !input_path.is_file() {
        bail!("Input file not found: {}", input_path.display());
    }
    info!(
        "Converting {} to {}...",
        input_path.display(),
        output_path.display()
    );

    let bytes_and_report = if has_extension(input_path, "gltf") {
        convert_scene_file(input_path, options)
    } else {
        let decoder = Decoder::new(&options.decoder_path);
        decoder.ensure_available()?;
        let work_dir = tempfile::Builder::new()
            .prefix("fbx2vrma-")
            .tempdir()
            .context("failed to create temporary directory")?;
        let scene_path = decoder.decode(input_path, work_dir.path())?;
        convert_scene_file(&scene_path, options)
    };
    let (bytes, report) = bytes_and_report?;

    if let Some(parent) = output_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory: {}", parent.display()))?;
    }
    fs::write(output_path, &bytes)
        .with_context(|| format!("failed to write output file: {}", output_path.display()))?;

    info!("Successfully converted to {}", output_path.display());
    Ok(report)
}

/// Load a decoded scene, inline its buffers, and run the VRMA transform.
fn convert_scene_file(
    scene_path: &Path,
    options: &ConvertOptions,
) -> Result<(Vec<u8>, ConversionReport)> {
    let content = fs::read(scene_path)
        .with_context(|| format!("failed to read glTF scene: {}", scene_path.display()))?;
    let document: Value = serde_json::from_slice(&content)
        .with_context(|| format!("failed to parse glTF JSON: {}", scene_path.display()))?;

    let base_dir = scene_path.parent().unwrap_or_else(|| Path::new("."));
    let embedded = embed_buffers(&document, base_dir)?;

    convert_with_report(&embedded, options.framerate)
        .with_context(|| format!("failed to convert {}", scene_path.display()))
}

/// Convert every FBX/glTF file directly inside `input_dir` into `output_dir`.
///
/// Individual failures are recorded and do not stop the batch.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<BatchReport> {
    let inputs = collect_batch_inputs(input_dir)?;
    if inputs.is_empty() {
        bail!("No FBX files found in: {}", input_dir.display());
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;
    info!("Found {} file(s) in {}", inputs.len(), input_dir.display());

    let mut report = BatchReport {
        total: inputs.len(),
        converted: Vec::new(),
        failures: Vec::new(),
    };

    for (index, input) in inputs.iter().enumerate() {
        let output = output_dir.join(vrma_file_name(input));
        info!(
            "[{}/{}] {}",
            index + 1,
            inputs.len(),
            input.file_name().unwrap_or_default().to_string_lossy()
        );
        match convert_file(input, &output, options) {
            Ok(_) => report.converted.push(output),
            Err(err) => {
                error!("Conversion failed: {:#}", err);
                report.failures.push(BatchFailure {
                    input: input.clone(),
                    message: format!("{err:#}"),
                });
            }
        }
    }

    info!(
        "Batch complete: {}/{} succeeded.",
        report.converted.len(),
        report.total
    );
    Ok(report)
}

fn collect_batch_inputs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read input directory: {}", input_dir.display()))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", input_dir.display()))?
            .path();
        if path.is_file()
            && BATCH_INPUT_EXTENSIONS
                .iter()
                .any(|extension| has_extension(&path, extension))
        {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Decide where a single conversion writes its output.
///
/// - no option: next to the input, with a `.vrma` extension
/// - an existing directory, or a path ending in a separator: inside it
/// - anything else: used as the output file path
pub fn resolve_output_path(input_path: &Path, output: Option<&Path>) -> PathBuf {
    let Some(output) = output else {
        return input_path.with_extension(VRMA_EXTENSION);
    };

    let raw = output.as_os_str().to_string_lossy();
    if output.is_dir() || raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR) {
        return output.join(vrma_file_name(input_path));
    }

    output.to_path_buf()
}

fn vrma_file_name(input_path: &Path) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    PathBuf::from(stem).with_extension(VRMA_EXTENSION)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
