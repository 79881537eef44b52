use anyhow::Context;
use clap::Parser;
use postal_addressing::config::cli::{Command, OutputFormat, ValidateArgs};
use postal_addressing::core::export::{render_list, Delimiter};
use postal_addressing::core::group_key::group_key;
use postal_addressing::core::ConfigProvider;
use postal_addressing::utils::error::{AddressError, ErrorSeverity};
use postal_addressing::utils::{logger, validation::Validate};
use postal_addressing::{
    Address, AddressValidator, CliConfig, Field, LocalStorage, SubdivisionRepository, TomlConfig,
};
use std::sync::Arc;

fn main() {
    let config = CliConfig::parse();

    let file_config = match config.file_config() {
        Ok(file_config) => file_config,
        Err(e) => {
            logger::init_cli_logger(config.verbose);
            exit_with_error(e.into());
        }
    };

    // 初始化日誌（命令列旗標優先，其次為 TOML 的 [logging] 區段）
    if config.json_logs || file_config.as_ref().is_some_and(|c| c.json_logs()) {
        logger::init_json_logger(file_config.as_ref().and_then(|c| c.log_level()));
    } else {
        logger::init_cli_logger(config.verbose);
    }

    match run(&config, file_config.as_ref()) {
        Ok(code) => std::process::exit(code),
        Err(e) => exit_with_error(e),
    }
}

fn exit_with_error(e: anyhow::Error) -> ! {
    if let Some(err) = e.downcast_ref::<AddressError>() {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            err,
            err.category(),
            err.severity()
        );
        eprintln!("❌ {}", err.user_friendly_message());
        eprintln!("💡 {}", err.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match err.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 2,
            ErrorSeverity::Medium => 3,
            ErrorSeverity::Critical => 4,
        };
        std::process::exit(exit_code);
    }
    eprintln!("❌ {:#}", e);
    std::process::exit(2);
}

fn run(config: &CliConfig, file_config: Option<&TomlConfig>) -> anyhow::Result<i32> {
    if let Command::GroupKey { country, codes } = &config.command {
        let mut parents = vec![country.to_uppercase()];
        parents.extend(codes.iter().cloned());
        println!("{}", group_key(&parents).unwrap_or_default());
        return Ok(0);
    }

    let settings = config.settings_with(file_config);
    settings.validate()?;
    tracing::debug!("Settings: {:?}", settings);

    let storage = LocalStorage::new(settings.data_path());
    let subdivisions = Arc::new(SubdivisionRepository::with_storage(storage));

    match &config.command {
        Command::Validate(args) => {
            let validator = AddressValidator::from_config(Arc::clone(&subdivisions), &settings)
                .with_extended_postal_validation(settings.extended_postal_validation() && !args.basic);
            validate(&validator, args)
        }
        Command::Format { country, locale } => {
            let locale = locale.as_deref().or(settings.default_locale());
            let format = subdivisions.formats().get(country)?;

            println!("Country: {}", format.country_code());
            println!("Layout:");
            for line in format.grouped_fields_for_locale(locale) {
                let tokens: Vec<&str> = line.iter().map(|f| f.token()).collect();
                println!("  {}", tokens.join(" "));
            }
            println!("Used fields: {}", join_fields(format.used_fields()));
            println!("Required fields: {}", join_fields(format.required_fields()));
            println!("Uppercase fields: {}", join_fields(format.uppercase_fields()));
            println!("Subdivision depth: {}", format.subdivision_depth());
            if let Some(pattern) = format.postal_code_pattern() {
                println!("Postal code pattern: {}", pattern.as_str());
            }
            if let Some(prefix) = format.postal_code_prefix() {
                println!("Postal code prefix: {}", prefix);
            }
            Ok(0)
        }
        Command::Subdivisions {
            country,
            parents,
            locale,
            output,
        } => {
            let locale = locale.as_deref().or(settings.default_locale());
            let mut path = vec![country.to_uppercase()];
            path.extend(parents.iter().cloned());
            let list = subdivisions.get_list(&path, locale);
            tracing::info!("📋 {} subdivisions under {}", list.len(), path.join(" > "));

            match output {
                OutputFormat::Text => {
                    for (code, name) in &list {
                        println!("{}\t{}", code, name);
                    }
                }
                OutputFormat::Csv => print!("{}", render_list(&list, Delimiter::Comma)?),
                OutputFormat::Tsv => print!("{}", render_list(&list, Delimiter::Tab)?),
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = list
                        .into_iter()
                        .map(|(code, name)| (code, serde_json::Value::String(name)))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
            }
            Ok(0)
        }
        Command::GroupKey { .. } => Ok(0),
    }
}

fn validate(validator: &AddressValidator<LocalStorage>, args: &ValidateArgs) -> anyhow::Result<i32> {
    let mut address = match &args.input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read address file '{}'", path))?;
            serde_json::from_str::<Address>(&content)
                .with_context(|| format!("Address file '{}' is not valid JSON", path))?
        }
        None => Address::default(),
    };
    if let Some(country) = &args.country {
        address.country_code = country.to_uppercase();
    }
    for (field, value) in &args.fields {
        address.set(*field, value.clone());
    }

    let violations = validator.validate(&address, &args.overrides())?;
    if violations.is_empty() {
        tracing::info!("✅ Address is valid for {}", address.country_code);
        println!("✅ valid");
        return Ok(0);
    }

    for violation in &violations {
        println!("{}", violation);
    }
    tracing::info!("❌ {} violation(s)", violations.len());
    Ok(1)
}

fn join_fields(fields: &[Field]) -> String {
    fields.iter().map(|f| f.token()).collect::<Vec<_>>().join(", ")
}
