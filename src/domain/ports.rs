use crate::domain::subdivision::{ParentRef, Subdivision};
use crate::utils::error::Result;
use std::sync::Arc;

/// Read-only access to reference data units addressed by relative path
/// (`address_format/US.json`, `subdivision/CN-1a2b3c4d5e6f.json`).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}

/// Resolves subdivisions by parent path. Unknown paths yield `None` or an
/// empty list, never an error.
pub trait SubdivisionLoader: Send + Sync {
    fn get(&self, code: &str, parents: &[String]) -> Option<Arc<Subdivision>>;
    fn get_all(&self, parents: &[String]) -> Vec<Arc<Subdivision>>;
    fn parent(&self, parent: &ParentRef) -> Option<Arc<Subdivision>>;
}

pub trait ConfigProvider: Send + Sync {
    fn data_path(&self) -> &str;
    fn extended_postal_validation(&self) -> bool;
    fn default_locale(&self) -> Option<&str>;
}
