use crate::core::format_repository::AddressFormatRepository;
use crate::core::subdivision_repository::SubdivisionRepository;
use crate::domain::address_format::{AddressFormat, PostalCodePattern};
use crate::domain::field::{Field, PatternType};
use crate::domain::model::{Address, FieldOverrides, Violation, ViolationKind};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::domain::subdivision::Subdivision;
use crate::utils::error::Result;
use std::sync::Arc;

/// Validates submitted addresses against country formats and subdivisions.
pub struct AddressValidator<S: Storage> {
    formats: Arc<AddressFormatRepository<S>>,
    subdivisions: Arc<SubdivisionRepository<S>>,
    extended_postal_validation: bool,
}

impl<S: Storage> AddressValidator<S> {
    pub fn new(subdivisions: Arc<SubdivisionRepository<S>>) -> Self {
        Self {
            formats: Arc::clone(subdivisions.formats()),
            subdivisions,
            extended_postal_validation: true,
        }
    }

    /// Whether subdivision postal code patterns refine the country pattern.
    pub fn with_extended_postal_validation(mut self, enabled: bool) -> Self {
        self.extended_postal_validation = enabled;
        self
    }

    pub fn from_config<C: ConfigProvider>(subdivisions: Arc<SubdivisionRepository<S>>, config: &C) -> Self {
        Self::new(subdivisions).with_extended_postal_validation(config.extended_postal_validation())
    }

    pub fn extended_postal_validation(&self) -> bool {
        self.extended_postal_validation
    }

    /// Returns the field-scoped violations; an empty list means the address
    /// is valid. Errors only come from broken reference data.
    pub fn validate(&self, address: &Address, overrides: &FieldOverrides) -> Result<Vec<Violation>> {
        let format = self.formats.get(&address.country_code)?;
        let used_fields = format.used_fields_with(overrides);
        let required_fields = format.required_fields_with(overrides);
        let mut violations = Vec::new();

        for field in &required_fields {
            if !address.has_value(*field) {
                violations.push(Violation::new(*field, ViolationKind::Required));
            }
        }

        for field in Field::all() {
            if !used_fields.contains(field) && address.has_value(*field) {
                violations.push(Violation::new(*field, ViolationKind::Blank));
            }
        }

        let subdivisions = self.walk_subdivisions(address, &format, &used_fields, &mut violations);

        if used_fields.contains(&Field::PostalCode) {
            self.check_postal_code(address, &format, &subdivisions, &mut violations);
        }

        tracing::debug!(
            "Validated {} address: {} violation(s), {} subdivision(s) matched",
            format.country_code(),
            violations.len(),
            subdivisions.len()
        );
        Ok(violations)
    }

    /// Matches subdivision fields level by level, outermost first.
    fn walk_subdivisions(
        &self,
        address: &Address,
        format: &AddressFormat,
        used_fields: &[Field],
        violations: &mut Vec<Violation>,
    ) -> Vec<Arc<Subdivision>> {
        let mut matched = Vec::new();
        if format.subdivision_depth() < 1 {
            return matched;
        }

        let mut parents = vec![format.country_code().to_string()];
        for field in format.used_subdivision_fields() {
            let value = address.value(field);
            if value.is_empty() || !used_fields.contains(&field) {
                break;
            }

            let Some(subdivision) = self.subdivisions.get(value, &parents) else {
                violations.push(Violation::new(field, ViolationKind::Invalid));
                break;
            };

            parents.push(subdivision.code().to_string());
            let has_children = subdivision.has_children();
            matched.push(subdivision);
            if !has_children {
                break;
            }
        }
        matched
    }

    fn check_postal_code(
        &self,
        address: &Address,
        format: &AddressFormat,
        subdivisions: &[Arc<Subdivision>],
        violations: &mut Vec<Violation>,
    ) {
        let postal_code = address.value(Field::PostalCode);
        if postal_code.is_empty() {
            return;
        }

        let mut full_pattern: Option<&PostalCodePattern> = format.postal_code_pattern();
        let mut start_pattern: Option<&PostalCodePattern> = None;
        if self.extended_postal_validation {
            // The deepest subdivision defining a pattern of each kind wins.
            for pattern in subdivisions.iter().filter_map(|s| s.postal_code_pattern()) {
                match pattern.kind() {
                    PatternType::Full => full_pattern = Some(pattern),
                    PatternType::Start => start_pattern = Some(pattern),
                }
            }
        }

        if let Some(pattern) = full_pattern {
            if !pattern.matches_full(postal_code) {
                violations.push(Violation::new(Field::PostalCode, ViolationKind::Invalid));
                return;
            }
        }
        if let Some(pattern) = start_pattern {
            if !pattern.matches_start(postal_code) {
                violations.push(Violation::new(Field::PostalCode, ViolationKind::Invalid));
            }
        }
    }
}
