//! Pipeline configuration

use std::path::Path;

use dataset_export::ExportConfig;
use feature_engine::FeatureConfig;
use frame_source::CaptureConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracking::TrackingConfig;
use vehicle_detector::{DetectorConfig, DetectorKind};

use crate::ConfigurationError;

/// Prefix of environment overrides, e.g. `MANEUVER__TRACKING__MAX_MISSED_STEPS=3`
pub const ENV_PREFIX: &str = "MANEUVER";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub tracking: TrackingConfig,
    pub features: FeatureConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Layer defaults, an optional TOML file and `MANEUVER__*` environment
    /// variables, later sources winning
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| ConfigurationError::Load(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| ConfigurationError::Load(e.to_string()))
    }

    /// Check values that would make a run meaningless
    pub fn validate(&self, path_count: usize) -> Result<(), ConfigurationError> {
        if self.capture.step == 0 {
            return Err(ConfigurationError::Invalid("capture.step must be at least 1".to_string()));
        }
        if self.capture.angles.len() != path_count {
            return Err(ConfigurationError::Invalid(format!(
                "{} camera angles configured for {} paths",
                self.capture.angles.len(),
                path_count
            )));
        }
        if self.features.signal_length == 0 {
            return Err(ConfigurationError::Invalid(
                "features.signal_length must be at least 1".to_string(),
            ));
        }
        if self.detector.kind == DetectorKind::Onnx && self.detector.model_path.is_none() {
            return Err(ConfigurationError::Invalid(
                "detector.model_path is required for the onnx detector".to_string(),
            ));
        }
        self.tracking
            .validate()
            .map_err(|e| ConfigurationError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate(4).is_ok());
        assert_eq!(config.capture.angles, vec![0, 90, 180, 270]);
        assert_eq!(config.features.signal_length, 128);
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let mut config = PipelineConfig::default();
        config.capture.step = 0;
        assert!(matches!(config.validate(4), Err(ConfigurationError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_angle_mismatch() {
        let config = PipelineConfig::default();
        assert!(config.validate(3).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_distance() {
        let mut config = PipelineConfig::default();
        config.tracking.max_match_distance = 0.0;
        assert!(config.validate(4).is_err());

        let mut config = PipelineConfig::default();
        config.features.signal_length = 0;
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[tracking]\nmax_match_distance = 12.5\nmax_missed_steps = 2\n\n[capture]\nstep = 3\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.tracking.max_match_distance, 12.5);
        assert_eq!(config.tracking.max_missed_steps, 2);
        assert_eq!(config.capture.step, 3);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(config.features.signal_length, 128);
        assert_eq!(config.export.output_dir, "assets/parsed");
    }

    #[test]
    fn test_load_missing_file() {
        let result = PipelineConfig::load(Some(Path::new("/nonexistent/pipeline.toml")));
        assert!(matches!(result, Err(ConfigurationError::Load(_))));
    }
}
