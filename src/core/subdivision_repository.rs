use crate::core::format_repository::AddressFormatRepository;
use crate::core::group_key::{group_key, storage_path};
use crate::domain::address_format::PostalCodePattern;
use crate::domain::field::PatternType;
use crate::domain::ports::{Storage, SubdivisionLoader};
use crate::domain::subdivision::{Children, ParentRef, Subdivision};
use crate::utils::error::{AddressError, Result};
use crate::utils::locale;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// On-disk shape of `subdivision/<group key>.json`.
#[derive(Debug, Deserialize)]
struct GroupDefinition {
    country_code: String,
    #[serde(default)]
    parents: Option<Vec<String>>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    subdivisions: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SubdivisionDefinition {
    #[serde(default)]
    local_code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    local_name: Option<String>,
    #[serde(default)]
    iso_code: Option<String>,
    #[serde(default)]
    postal_code_pattern: Option<String>,
    #[serde(default)]
    postal_code_pattern_type: Option<PatternType>,
    #[serde(default)]
    has_children: bool,
}

/// The direct children of one parent path, in storage order.
#[derive(Debug)]
pub struct SubdivisionGroup {
    key: String,
    parents: Vec<String>,
    locale: Option<String>,
    subdivisions: Vec<Arc<Subdivision>>,
    index: HashMap<String, usize>,
}

impl SubdivisionGroup {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn subdivisions(&self) -> &[Arc<Subdivision>] {
        &self.subdivisions
    }

    /// Looks up by code first, then by local code.
    pub fn find(&self, code: &str) -> Option<&Arc<Subdivision>> {
        if let Some(index) = self.index.get(code) {
            return self.subdivisions.get(*index);
        }
        self.subdivisions
            .iter()
            .find(|s| s.local_code() == Some(code))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Loads subdivision groups on demand and memoizes them for the lifetime of
/// the repository. Creating a new repository is the only way to drop the caches.
pub struct SubdivisionRepository<S: Storage> {
    storage: S,
    formats: Arc<AddressFormatRepository<S>>,
    groups: Mutex<HashMap<String, Option<Arc<SubdivisionGroup>>>>,
    parents: Mutex<HashMap<String, Option<Arc<Subdivision>>>>,
}

impl<S: Storage + Clone> SubdivisionRepository<S> {
    /// Builds a repository and its format repository over the same storage.
    pub fn with_storage(storage: S) -> Self {
        let formats = Arc::new(AddressFormatRepository::new(storage.clone()));
        Self::new(storage, formats)
    }
}

impl<S: Storage> SubdivisionRepository<S> {
    pub fn new(storage: S, formats: Arc<AddressFormatRepository<S>>) -> Self {
        Self {
            storage,
            formats,
            groups: Mutex::new(HashMap::new()),
            parents: Mutex::new(HashMap::new()),
        }
    }

    pub fn formats(&self) -> &Arc<AddressFormatRepository<S>> {
        &self.formats
    }

    /// The subdivision with `code` (or local code) under `parents`.
    pub fn get(&self, code: &str, parents: &[String]) -> Option<Arc<Subdivision>> {
        let group = self.load_group(parents)?;
        group.find(code.trim()).cloned()
    }

    /// Every direct child of `parents`.
    pub fn get_all(&self, parents: &[String]) -> Vec<Arc<Subdivision>> {
        self.load_group(parents)
            .map(|group| group.subdivisions.clone())
            .unwrap_or_default()
    }

    /// Code to display name, in storage order. Local names are used when
    /// `locale` matches the group's locale.
    pub fn get_list(&self, parents: &[String], locale: Option<&str>) -> Vec<(String, String)> {
        let Some(group) = self.load_group(parents) else {
            return Vec::new();
        };
        let use_local_name = locale::matches_opt(locale, group.locale());

        group
            .subdivisions
            .iter()
            .map(|subdivision| {
                let name = if use_local_name {
                    subdivision.local_name().unwrap_or(subdivision.name())
                } else {
                    subdivision.name()
                };
                (subdivision.code().to_string(), name.to_string())
            })
            .collect()
    }

    /// Resolves a parent reference, memoized per group and code.
    pub fn resolve_parent(&self, parent: &ParentRef) -> Option<Arc<Subdivision>> {
        let key = format!("{}:{}", group_key(parent.parents())?, parent.code());
        if let Some(cached) = self.lock_parents().get(&key) {
            return cached.clone();
        }

        let resolved = self.get(parent.code(), parent.parents());
        self.lock_parents().entry(key).or_insert(resolved).clone()
    }

    /// The group for `parents`, loading it on first use.
    pub fn load_group(&self, parents: &[String]) -> Option<Arc<SubdivisionGroup>> {
        let parents = normalize(parents)?;
        if !self.has_data(&parents) {
            return None;
        }
        let key = group_key(&parents)?;

        let mut groups = self.lock_groups();
        if let Some(cached) = groups.get(&key) {
            tracing::trace!("Subdivision group {} served from cache", key);
            return cached.clone();
        }

        let group = self.read_group(&key, &parents).map(Arc::new);
        groups.insert(key, group.clone());
        group
    }

    /// Decides without I/O whether `parents` can have children at all.
    fn has_data(&self, parents: &[String]) -> bool {
        let Some(country_code) = parents.first() else {
            return false;
        };

        let depth = match self.formats.get(country_code) {
            Ok(format) => usize::from(format.subdivision_depth()),
            Err(e) => {
                tracing::warn!("Address format for {} is unusable: {}", country_code, e);
                0
            }
        };
        if parents.len() > depth {
            return false;
        }

        if let Some((code, grandparents)) = parents.split_last().filter(|_| parents.len() > 1) {
            let key = group_key(grandparents);
            let groups = self.lock_groups();
            if let Some(Some(parent_group)) = key.and_then(|k| groups.get(&k)) {
                if let Some(parent) = parent_group.find(code) {
                    return parent.has_children();
                }
            }
        }

        true
    }

    fn read_group(&self, key: &str, parents: &[String]) -> Option<SubdivisionGroup> {
        let path = storage_path(key);
        let data = match self.storage.read_file(&path) {
            Ok(data) => data,
            Err(e) if e.is_not_found() => {
                tracing::debug!("No subdivision group {}", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Could not read subdivision group {}: {}", key, e);
                return None;
            }
        };

        match build_group(key, parents, &data) {
            Ok(group) => {
                tracing::debug!(
                    "Loaded subdivision group {} ({} subdivisions)",
                    key,
                    group.subdivisions.len()
                );
                Some(group)
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed subdivision group {}: {}", key, e);
                None
            }
        }
    }

    fn lock_groups(&self) -> MutexGuard<'_, HashMap<String, Option<Arc<SubdivisionGroup>>>> {
        self.groups.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_parents(&self) -> MutexGuard<'_, HashMap<String, Option<Arc<Subdivision>>>> {
        self.parents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: Storage> SubdivisionLoader for SubdivisionRepository<S> {
    fn get(&self, code: &str, parents: &[String]) -> Option<Arc<Subdivision>> {
        SubdivisionRepository::get(self, code, parents)
    }

    fn get_all(&self, parents: &[String]) -> Vec<Arc<Subdivision>> {
        SubdivisionRepository::get_all(self, parents)
    }

    fn parent(&self, parent: &ParentRef) -> Option<Arc<Subdivision>> {
        self.resolve_parent(parent)
    }
}

fn normalize(parents: &[String]) -> Option<Vec<String>> {
    let (country_code, codes) = parents.split_first()?;
    let country_code = country_code.trim().to_uppercase();
    if country_code.is_empty() {
        return None;
    }

    let mut normalized = Vec::with_capacity(parents.len());
    normalized.push(country_code);
    normalized.extend(codes.iter().map(|code| code.trim().to_string()));
    Some(normalized)
}

fn build_group(key: &str, parents: &[String], data: &[u8]) -> Result<SubdivisionGroup> {
    let definition: GroupDefinition = serde_json::from_slice(data)?;
    let country_code = &parents[0];

    if !definition.country_code.eq_ignore_ascii_case(country_code) {
        return Err(AddressError::definition(
            country_code,
            format!("group {} belongs to {}", key, definition.country_code),
        ));
    }
    if let Some(stored) = &definition.parents {
        let matches = stored.len() == parents.len()
            && stored[0].eq_ignore_ascii_case(country_code)
            && stored[1..] == parents[1..];
        if !matches {
            return Err(AddressError::definition(
                country_code,
                format!("group {} was stored for parents {:?}", key, stored),
            ));
        }
    }

    let locale = non_empty(definition.locale);
    let parent = ParentRef::new(parents.to_vec());
    let mut subdivisions = Vec::with_capacity(definition.subdivisions.len());
    let mut index = HashMap::with_capacity(definition.subdivisions.len());

    for (code, value) in definition.subdivisions {
        let record: SubdivisionDefinition = serde_json::from_value(value)?;
        let pattern = non_empty(record.postal_code_pattern)
            .map(|p| PostalCodePattern::new(&p, record.postal_code_pattern_type.unwrap_or_default()))
            .transpose()?;
        let children = if record.has_children {
            Children::lazy()
        } else {
            Children::none()
        };

        let subdivision = Subdivision::builder(country_code.clone(), code.clone())
            .parent(parent.clone())
            .local_code(non_empty(record.local_code))
            .name(non_empty(record.name))
            .local_name(non_empty(record.local_name))
            .iso_code(non_empty(record.iso_code))
            .postal_code_pattern(pattern)
            .locale(locale.clone())
            .children(children)
            .build();

        index.insert(code, subdivisions.len());
        subdivisions.push(Arc::new(subdivision));
    }

    Ok(SubdivisionGroup {
        key: key.to_string(),
        parents: parents.to_vec(),
        locale,
        subdivisions,
        index,
    })
}
