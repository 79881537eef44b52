use crate::domain::address_format::{AddressFormat, AddressFormatDefinition};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Loads and caches per-country address formats from `address_format/<CC>.json`.
pub struct AddressFormatRepository<S: Storage> {
    storage: S,
    formats: RwLock<HashMap<String, Arc<AddressFormat>>>,
    generic: Arc<AddressFormat>,
}

impl<S: Storage> AddressFormatRepository<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            formats: RwLock::new(HashMap::new()),
            generic: Arc::new(AddressFormat::generic()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The format for `country_code`, or the generic format when none is
    /// defined. Broken definitions are reported as errors. Only defined
    /// formats are cached, so unknown codes do not grow the cache.
    pub fn get(&self, country_code: &str) -> Result<Arc<AddressFormat>> {
        let country_code = country_code.trim().to_uppercase();
        if country_code.is_empty() {
            return Ok(Arc::clone(&self.generic));
        }

        if let Some(format) = self
            .formats
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&country_code)
        {
            return Ok(Arc::clone(format));
        }

        let Some(format) = self.load(&country_code)? else {
            tracing::debug!("No address format for {}, using generic format", country_code);
            return Ok(Arc::clone(&self.generic));
        };
        let format = Arc::new(format);

        let mut formats = self.formats.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let format = formats.entry(country_code).or_insert(format);
        Ok(Arc::clone(format))
    }

    /// Whether a definition exists for the country, without the generic fallback.
    pub fn has(&self, country_code: &str) -> Result<bool> {
        let format = self.get(country_code)?;
        Ok(!Arc::ptr_eq(&format, &self.generic))
    }

    fn load(&self, country_code: &str) -> Result<Option<AddressFormat>> {
        let path = format!("address_format/{}.json", country_code);
        let data = match self.storage.read_file(&path) {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let definition: AddressFormatDefinition = serde_json::from_slice(&data).map_err(|e| {
            tracing::error!("❌ Malformed address format {}: {}", path, e);
            e
        })?;
        let format = AddressFormat::from_definition(country_code, definition)?;
        tracing::debug!(
            "Loaded address format {} (subdivision depth {})",
            country_code,
            format.subdivision_depth()
        );
        Ok(Some(format))
    }
}
