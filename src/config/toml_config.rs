use crate::core::ConfigProvider;
use crate::utils::error::{AddressError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub data: DataConfig,
    pub validation: Option<ValidationSettings>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    pub extended_postal_validation: Option<bool>,
    pub default_locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                path: Some("./data".to_string()),
            },
            validation: None,
            logging: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AddressError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AddressError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ADDRESSING_DATA})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let path = validation::validate_required_field("data.path", &self.data.path)?;
        validation::validate_path("data.path", path)?;

        if let Some(locale) = self.validation.as_ref().and_then(|v| v.default_locale.as_deref()) {
            validation::validate_non_empty_string("validation.default_locale", locale)?;
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }

        Ok(())
    }

    /// 取得資料目錄
    pub fn data_path(&self) -> &str {
        self.data.path.as_deref().unwrap_or("./data")
    }

    /// 是否啟用子行政區郵遞區號驗證
    pub fn extended_postal_validation(&self) -> bool {
        self.validation
            .as_ref()
            .and_then(|v| v.extended_postal_validation)
            .unwrap_or(true)
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.validation.as_ref().and_then(|v| v.default_locale.as_deref())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn data_path(&self) -> &str {
        self.data_path()
    }

    fn extended_postal_validation(&self) -> bool {
        self.extended_postal_validation()
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
