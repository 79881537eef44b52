pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{LocalStorage, MemoryStorage};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;
pub use core::{AddressFormatRepository, AddressValidator, SubdivisionRepository};
pub use domain::address_format::{AddressFormat, PostalCodePattern};
pub use domain::field::{Field, PatternType};
pub use domain::model::{Address, FieldOverride, FieldOverrides, Violation, ViolationKind};
pub use domain::subdivision::{ParentRef, Subdivision};
pub use utils::error::{AddressError, Result};
