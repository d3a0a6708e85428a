//! Engine configuration loaded from TOML.
//!
//! Every section and field is optional; anything missing falls back to the
//! built-in defaults. Example:
//!
//! ```toml
//! [vocabulary]
//! storefront_names = ["My Record Shop"]
//!
//! [scoring]
//! default_threshold = 0.6
//!
//! [matching]
//! threshold = 0.6
//! strategy = "optimal"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{validate_threshold, Result};
use crate::extract::Extractor;
use crate::matcher::MatchOptions;
use crate::scoring::{Scorer, ScoringConfig};
use crate::vocabulary::Vocabulary;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vocabulary: Vocabulary,
    pub scoring: ScoringConfig,
    pub matching: MatchOptions,
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Check every value that would otherwise only fail at engine construction.
    pub fn validate(&self) -> Result<()> {
        Extractor::new(&self.vocabulary)?;
        Scorer::new(self.scoring.clone())?;
        validate_threshold(self.matching.threshold)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use crate::matcher::MatchStrategy;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [vocabulary]
            storefront_names = ["Shop One"]

            [matching]
            threshold = 0.7
            strategy = "optimal"
            "#,
        )
        .unwrap();
        assert_eq!(config.vocabulary.storefront_names, vec!["Shop One".to_string()]);
        assert_eq!(config.vocabulary.colors, Vocabulary::default().colors);
        assert_eq!(config.matching.threshold, 0.7);
        assert_eq!(config.matching.strategy, MatchStrategy::Optimal);
        assert_eq!(config.scoring, ScoringConfig::default());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let result = EngineConfig::from_toml_str("[matching]\nthreshold = 1.5\n");
        assert!(matches!(result, Err(MatchError::InvalidThreshold(_))));
    }

    #[test]
    fn test_bad_weights_rejected() {
        let result = EngineConfig::from_toml_str("[scoring.weights]\nartist_exact = 0.9\n");
        assert!(matches!(result, Err(MatchError::InvalidWeights { .. })));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = EngineConfig::from_toml_str("[matching\nthreshold = ");
        assert!(matches!(result, Err(MatchError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scoring]\ndefault_threshold = 0.6").unwrap();
        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.scoring.default_threshold, 0.6);
        assert!(EngineConfig::load(None).is_ok());
    }
}
