//! JSON configuration and report helpers for fractal marker detection.

use crate::{
    ConfigError, DetectError, DetectorParams, FractalDetection, MarkerDetector, MarkerFamily,
    MarkerModelSet, StateError, Units,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum FractalIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors building a detector from a [`FractalDetectConfig`].
#[derive(thiserror::Error, Debug)]
pub enum FractalSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    State(#[from] StateError),
}

/// Configuration for the fractal detection example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractalDetectConfig {
    pub image_path: String,
    /// Family name, e.g. `"FRACTAL_4L_6"`.
    pub family: String,
    /// Root marker side in meters; absent or non-positive keeps model units.
    #[serde(default)]
    pub marker_size: Option<f32>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub correspondences: bool,
    #[serde(default)]
    pub params: Option<DetectorParams>,
}

impl FractalDetectConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FractalIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FractalIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("fractal_detect_report.json"))
    }

    /// Build the detector: family lookup, optional physical scale, params.
    pub fn build_detector(&self) -> Result<MarkerDetector, FractalSetupError> {
        let family: MarkerFamily = self.family.parse()?;
        let mut set = MarkerModelSet::from_family(family)?;
        if let Some(size) = self.marker_size.filter(|&s| s > 0.0) {
            set.convert_to_physical_scale(size)?;
        }
        let params = self.params.clone().unwrap_or_default();
        Ok(MarkerDetector::new(set, params))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractalDetectReport {
    pub image_path: String,
    pub config_path: String,
    pub family: String,
    pub units: Option<Units>,
    #[serde(default)]
    pub detection: Option<FractalDetection>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FractalDetectReport {
    /// Build a base report from the input config.
    pub fn new(cfg: &FractalDetectConfig, config_path: &Path) -> Self {
        Self {
            image_path: cfg.image_path.clone(),
            config_path: config_path.to_string_lossy().into_owned(),
            family: cfg.family.clone(),
            units: None,
            detection: None,
            error: None,
        }
    }

    /// Populate report fields from a successful detection.
    pub fn set_detection(&mut self, units: Units, res: FractalDetection) {
        self.units = Some(units);
        self.detection = Some(res);
        self.error = None;
    }

    /// Record a detection error.
    pub fn set_error(&mut self, err: DetectError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, FractalIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), FractalIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
