//! Pipeline configuration and JSON loading.
//!
//! Every section has a default, so an empty JSON object is a complete configuration
//! for the default Hebrew letter sheet.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::{ConfigError, ConfigValidator, ParallelPolicy};
use crate::domain::alphabet::{Alphabet, GridLayout, SlotSpec, hebrew_slot_specs};
use crate::font::FontMetricsConfig;
use crate::processors::{
    AssignerConfig, CanvasConfig, ComponentConfig, InkClassifierConfig, RowClusterConfig,
    TraceConfig,
};

/// Configuration of a full page-to-font run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Layout of the letter grid on the page.
    pub grid: GridLayout,
    /// Alphabet order with per-slot codepoints and overrides.
    pub alphabet: Vec<SlotSpec>,
    pub ink: InkClassifierConfig,
    pub extraction: ComponentConfig,
    pub rows: RowClusterConfig,
    pub assignment: AssignerConfig,
    pub canvas: CanvasConfig,
    pub trace: TraceConfig,
    pub font: FontMetricsConfig,
    pub parallel: ParallelPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid: GridLayout::default(),
            alphabet: hebrew_slot_specs(),
            ink: InkClassifierConfig::default(),
            extraction: ComponentConfig::default(),
            rows: RowClusterConfig::default(),
            assignment: AssignerConfig::default(),
            canvas: CanvasConfig::default(),
            trace: TraceConfig::default(),
            font: FontMetricsConfig::default(),
            parallel: ParallelPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::invalid(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ConfigError::invalid(format!("failed to parse JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid(format!("failed to serialize config to JSON: {e}")))
    }

    /// Writes the configuration to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| {
            ConfigError::invalid(format!(
                "failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Builds the validated alphabet table.
    pub fn build_alphabet(&self) -> Result<Alphabet, ConfigError> {
        Alphabet::from_specs(&self.alphabet)
    }
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let alphabet = self.build_alphabet()?;
        self.grid.row_lengths(alphabet.len())?;
        self.ink.validate()?;
        self.extraction.validate()?;
        self.rows.validate()?;
        self.assignment.validate()?;
        self.canvas.validate()?;
        self.trace.validate()?;
        self.font.validate()?;
        if self.parallel.max_threads == Some(0) {
            return Err(ConfigError::invalid("parallel.max_threads must be at least 1"));
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::get_defaults();
        assert!(config.validate().is_ok());
        assert_eq!(config.build_alphabet().unwrap().len(), 27);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = PipelineConfig::default();
        config.font.family_name = "Sheet".to_string();
        config.canvas.canvas_size = 400;
        let json = config.to_json().unwrap();
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_partial_sections() {
        let config = PipelineConfig::from_json(
            r#"{"font": {"family_name": "Mine", "ascender": 750, "descender": -250}}"#,
        )
        .unwrap();
        assert_eq!(config.font.family_name, "Mine");
        assert_eq!(config.font.units_per_em, 1000);
        assert_eq!(config.canvas, CanvasConfig::default());
    }

    #[test]
    fn test_rejects_grid_that_cannot_hold_alphabet() {
        let err = PipelineConfig::from_json(r#"{"grid": {"rows": 2, "max_columns": 4}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGrid { .. }));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(PipelineConfig::from_json(r#"{"canvas": {"canvas_size": 80, "margin": 40}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"parallel": {"max_threads": 0}}"#).is_err());
        assert!(PipelineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_custom_alphabet() {
        let config = PipelineConfig::from_json(
            r#"{
                "grid": {"rows": 1, "max_columns": 3, "direction": "left_to_right"},
                "alphabet": [
                    {"name": "a", "codepoint": "a"},
                    {"name": "b", "codepoint": "b"},
                    {"name": "c", "codepoint": "c"}
                ]
            }"#,
        )
        .unwrap();
        let alphabet = config.build_alphabet().unwrap();
        assert_eq!(alphabet.by_name("c").unwrap().codepoint, 'c');
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"font": {{"family_name": "FromFile"}}}}"#).unwrap();
        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.font.family_name, "FromFile");

        let missing = PipelineConfig::from_file("/nonexistent/handfont.json").unwrap_err();
        assert!(matches!(missing, ConfigError::FileNotFound { .. }));
    }
}
