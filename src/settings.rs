use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::convert::{ConvertOptions, Framerate};

/// Persisted converter settings used by CLI workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    pub decoder_path: Option<String>,
    pub framerate: u32,
    pub output_dir: Option<String>,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            decoder_path: None,
            framerate: Framerate::default().get(),
            output_dir: None,
        }
    }
}

impl ConverterSettings {
    /// Layer command-line values over the file values.
    pub fn apply_overrides(&mut self, framerate: Option<u32>, decoder_path: Option<&Path>) {
        if let Some(framerate) = framerate {
            self.framerate = framerate;
        }
        if let Some(decoder_path) = decoder_path {
            self.decoder_path = Some(decoder_path.to_string_lossy().into_owned());
        }
    }

    /// Resolve the settings into validated conversion options.
    pub fn to_options(&self) -> Result<ConvertOptions> {
        let framerate = Framerate::try_from(i64::from(self.framerate))
            .context("invalid framerate in settings")?;
        let decoder_path = self
            .decoder_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| ConvertOptions::default().decoder_path);
        Ok(ConvertOptions {
            framerate,
            decoder_path,
        })
    }
}

/// Save converter settings to a JSON file.
pub fn save_settings(path: &Path, settings: &ConverterSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize converter settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save converter settings: {}", path.display()))?;
    Ok(())
}

/// Load converter settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<ConverterSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load converter settings: {}", path.display()))?;
    let settings: ConverterSettings =
        serde_json::from_str(&content).context("failed to parse converter settings JSON")?;
    Ok(settings)
}
