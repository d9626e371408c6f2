use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

/// Platform-specific file name of the FBX2glTF release binary.
///
/// macOS always uses the x64 build; Apple Silicon runs it through Rosetta 2.
pub fn default_decoder_binary_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "FBX2glTF-windows-x64.exe"
    } else if cfg!(target_os = "linux") {
        "FBX2glTF-linux-x64"
    } else {
        "FBX2glTF-darwin-x64"
    }
}

/// Wrapper around the external FBX2glTF executable.
#[derive(Debug, Clone)]
pub struct Decoder {
    binary: PathBuf,
}

impl Decoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Fail early when the decoder executable is missing.
    pub fn ensure_available(&self) -> Result<()> {
        if !self.binary.is_file() {
            bail!(
                "FBX2glTF binary not found: {}\nDownload it and pass its path with --fbx2gltf.",
                self.binary.display()
            );
        }
        Ok(())
    }

    /// Decode `input` into a `.gltf` scene inside `work_dir` and return its path.
    ///
    /// An embedded-buffer export is tried first; if the decoder rejects it the
    /// plain export (scene plus sibling `.bin`) is used instead.
    pub fn decode(&self, input: &Path, work_dir: &Path) -> Result<PathBuf> {
        self.ensure_available()?;
        let stem = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .context("input file has no usable file name")?;
        let output_base = work_dir.join(stem);

        if let Err(err) = self.run(input, &output_base, true) {
            warn!("Embedded export failed ({err:#}); retrying without --embed");
            self.run(input, &output_base, false)
                .context("FBX2glTF conversion failed")?;
        }

        decoded_scene_path(work_dir, stem)
    }

    fn run(&self, input: &Path, output_base: &Path, embed: bool) -> Result<()> {
        let mut command = Command::new(&self.binary);
        command.arg("-i").arg(input).arg("-o").arg(output_base);
        if embed {
            command.arg("--embed");
        }
        info!("Executing: {:?}", command);

        let output = command
            .output()
            .with_context(|| format!("failed to launch {}", self.binary.display()))?;
        debug!("FBX2glTF stdout: {}", String::from_utf8_lossy(&output.stdout));

        if !output.status.success() {
            bail!(
                "FBX2glTF exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// FBX2glTF writes `<base>_out/<stem>.gltf`; some builds write `<base>.gltf`.
fn decoded_scene_path(work_dir: &Path, stem: &str) -> Result<PathBuf> {
    let candidates = [
        work_dir
            .join(format!("{stem}_out"))
            .join(format!("{stem}.gltf")),
        work_dir.join(format!("{stem}.gltf")),
    ];
    candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .with_context(|| format!("FBX2glTF produced no glTF scene in {}", work_dir.display()))
}
