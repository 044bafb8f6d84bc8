//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "model.name must not be empty".into(),
            ));
        }
        if self.model.target_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.target_size must be > 0".into(),
            ));
        }
        for (field, value) in [
            ("tagging.general_threshold", self.tagging.general_threshold),
            (
                "tagging.character_threshold",
                self.tagging.character_threshold,
            ),
            ("tagging.character_floor", self.tagging.character_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must be between 0.0 and 1.0"
                )));
            }
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.inference_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.inference_timeout_ms must be > 0".into(),
            ));
        }
        if !matches!(self.output.format.as_str(), "json" | "jsonl") {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be 'json' or 'jsonl', got '{}'",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.tagging.general_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("general_threshold"));

        config.tagging.general_threshold = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("general_threshold"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_floor() {
        let mut config = Config::default();
        config.tagging.character_floor = 2.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("character_floor"));
    }

    #[test]
    fn test_validate_rejects_zero_target_size() {
        let mut config = Config::default();
        config.model.target_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_size"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.inference_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("inference_timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "yaml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }
}
