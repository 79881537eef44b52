#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

/// Effective runtime settings: the TOML file with command line overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_path: String,
    pub extended_postal_validation: bool,
    pub default_locale: Option<String>,
}

impl Settings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            data_path: config.data_path().to_string(),
            extended_postal_validation: config.extended_postal_validation(),
            default_locale: config.default_locale().map(str::to_string),
        }
    }

    pub fn with_data_path(mut self, data_path: Option<String>) -> Self {
        if let Some(data_path) = data_path {
            self.data_path = data_path;
        }
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}

impl ConfigProvider for Settings {
    fn data_path(&self) -> &str {
        &self.data_path
    }

    fn extended_postal_validation(&self) -> bool {
        self.extended_postal_validation
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_directory("data.path", &self.data_path)
    }
}
