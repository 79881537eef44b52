use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Storage unit not found: {path}")]
    NotFoundError { path: String },

    #[error("Invalid address format definition for {country_code}: {message}")]
    InvalidDefinitionError {
        country_code: String,
        message: String,
    },

    #[error("Invalid postal code pattern '{pattern}': {source}")]
    InvalidPatternError {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ReferenceData,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AddressError {
    pub fn definition(country_code: &str, message: impl Into<String>) -> Self {
        AddressError::InvalidDefinitionError {
            country_code: country_code.to_string(),
            message: message.into(),
        }
    }

    /// 儲存單元不存在（檔案或記憶體項目）
    pub fn is_not_found(&self) -> bool {
        match self {
            AddressError::NotFoundError { .. } => true,
            AddressError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AddressError::IoError(_) | AddressError::CsvError(_) | AddressError::NotFoundError { .. } => {
                ErrorCategory::Storage
            }
            AddressError::SerializationError(_)
            | AddressError::InvalidDefinitionError { .. }
            | AddressError::InvalidPatternError { .. } => ErrorCategory::ReferenceData,
            AddressError::ConfigError { .. }
            | AddressError::ConfigValidationError { .. }
            | AddressError::InvalidConfigValueError { .. }
            | AddressError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::ReferenceData => ErrorSeverity::Critical,
            ErrorCategory::Storage if self.is_not_found() => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AddressError::NotFoundError { .. } => "Check that the data directory contains the requested definition",
            AddressError::IoError(_) => "Check the data directory path and its permissions",
            AddressError::CsvError(_) => "Check that the output can be written",
            AddressError::SerializationError(_) => "Fix the JSON syntax of the reference data file",
            AddressError::InvalidDefinitionError { .. } => {
                "Fix the address format definition; required and uppercase fields must appear in the format"
            }
            AddressError::InvalidPatternError { .. } => "Fix the postal code regular expression in the reference data",
            AddressError::ConfigError { .. } | AddressError::ConfigValidationError { .. } => {
                "Check the TOML configuration file syntax"
            }
            AddressError::InvalidConfigValueError { .. } => "Correct the configuration value and retry",
            AddressError::MissingConfigError { .. } => "Add the missing setting to the configuration file",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::ReferenceData => format!("Reference data is broken: {}", self),
            ErrorCategory::Storage => format!("Could not read reference data: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AddressError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let missing = AddressError::NotFoundError {
            path: "subdivision/XX.json".to_string(),
        };
        assert!(missing.is_not_found());

        let io = AddressError::IoError(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(io.is_not_found());

        let denied = AddressError::IoError(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(!denied.is_not_found());
        assert_eq!(denied.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_reference_data_errors_are_critical() {
        let err = AddressError::definition("US", "format is missing");
        assert_eq!(err.category(), ErrorCategory::ReferenceData);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("US"));
    }
}
