use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::domain::field::Field;
use crate::domain::model::{FieldOverride, FieldOverrides};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "addressing")]
#[command(about = "Address format metadata, subdivision lookup and validation")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Reference data directory (overrides data.path)
    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate an address and list its violations
    Validate(ValidateArgs),

    /// Show the address format of a country
    Format {
        country: String,
        #[arg(long)]
        locale: Option<String>,
    },

    /// List the subdivisions below a parent path
    Subdivisions {
        country: String,
        /// Codes leading to the parent subdivision
        parents: Vec<String>,
        #[arg(long)]
        locale: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the storage key of a parent path
    GroupKey {
        country: String,
        codes: Vec<String>,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct ValidateArgs {
    #[arg(long)]
    pub country: Option<String>,

    /// Field value as name=value, e.g. --field administrativeArea=CA
    #[arg(short, long = "field", value_parser = parse_field_assignment)]
    pub fields: Vec<(Field, String)>,

    /// JSON file holding an address ({"country_code": .., "fields": {..}})
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, value_parser = parse_field)]
    pub hidden: Vec<Field>,

    #[arg(long, value_parser = parse_field)]
    pub optional: Vec<Field>,

    #[arg(long, value_parser = parse_field)]
    pub required: Vec<Field>,

    /// Only check postal codes against the country pattern
    #[arg(long)]
    pub basic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Csv,
    Tsv,
    Json,
}

impl CliConfig {
    /// 載入並驗證 TOML 配置（若有指定）
    pub fn file_config(&self) -> Result<Option<TomlConfig>> {
        let Some(path) = &self.config else {
            return Ok(None);
        };
        let config = TomlConfig::from_file(path)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// 以已載入的配置為基礎並套用命令列覆蓋
    pub fn settings_with(&self, file_config: Option<&TomlConfig>) -> Settings {
        file_config
            .map(Settings::from_toml)
            .unwrap_or_default()
            .with_data_path(self.data_dir.clone())
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.settings_with(self.file_config()?.as_ref()))
    }
}

impl ValidateArgs {
    pub fn overrides(&self) -> FieldOverrides {
        let mut overrides = FieldOverrides::new();
        for field in &self.hidden {
            overrides.set(*field, FieldOverride::Hidden);
        }
        for field in &self.optional {
            overrides.set(*field, FieldOverride::Optional);
        }
        for field in &self.required {
            overrides.set(*field, FieldOverride::Required);
        }
        overrides
    }
}

fn parse_field(value: &str) -> std::result::Result<Field, String> {
    value.parse()
}

fn parse_field_assignment(value: &str) -> std::result::Result<(Field, String), String> {
    let (name, field_value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", value))?;
    Ok((name.parse()?, field_value.to_string()))
}
