use crate::domain::field::{
    AdministrativeAreaType, DependentLocalityType, Field, LocalityType, PatternType, PostalCodeType,
};
use crate::domain::model::FieldOverrides;
use crate::utils::error::{AddressError, Result};
use crate::utils::locale;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Country code of the built-in format used for unknown countries.
pub const GENERIC_COUNTRY_CODE: &str = "ZZ";

const GENERIC_FORMAT: &str =
    "%givenName %familyName\n%organization\n%addressLine1\n%addressLine2\n%addressLine3\n%locality";

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%([A-Za-z0-9]+)").unwrap());

/// A compiled, case-insensitive postal code pattern.
#[derive(Debug, Clone)]
pub struct PostalCodePattern {
    source: String,
    regex: Regex,
    kind: PatternType,
}

impl PostalCodePattern {
    pub fn new(source: &str, kind: PatternType) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| AddressError::InvalidPatternError {
                pattern: source.to_string(),
                source: e,
            })?;

        Ok(Self {
            source: source.to_string(),
            regex,
            kind,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> PatternType {
        self.kind
    }

    /// The first match must cover the whole value.
    pub fn matches_full(&self, value: &str) -> bool {
        self.regex
            .find(value)
            .is_some_and(|m| m.start() == 0 && m.end() == value.len())
    }

    /// The first match must begin at offset zero.
    pub fn matches_start(&self, value: &str) -> bool {
        self.regex.find(value).is_some_and(|m| m.start() == 0)
    }

    pub fn matches(&self, value: &str) -> bool {
        match self.kind {
            PatternType::Full => self.matches_full(value),
            PatternType::Start => self.matches_start(value),
        }
    }
}

impl PartialEq for PostalCodePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.kind == other.kind
    }
}

/// Raw, on-disk shape of an address format (`address_format/<CC>.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressFormatDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_format: Option<String>,
    #[serde(default)]
    pub required_fields: Vec<Field>,
    #[serde(default)]
    pub uppercase_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrative_area_type: Option<AdministrativeAreaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality_type: Option<LocalityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_locality_type: Option<DependentLocalityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code_type: Option<PostalCodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code_prefix: Option<String>,
    #[serde(default)]
    pub subdivision_depth: u8,
}

/// Immutable per-country layout and validation metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressFormat {
    country_code: String,
    locale: Option<String>,
    format: String,
    local_format: Option<String>,
    required_fields: Vec<Field>,
    uppercase_fields: Vec<Field>,
    administrative_area_type: Option<AdministrativeAreaType>,
    locality_type: Option<LocalityType>,
    dependent_locality_type: Option<DependentLocalityType>,
    postal_code_type: Option<PostalCodeType>,
    postal_code_pattern: Option<PostalCodePattern>,
    postal_code_prefix: Option<String>,
    subdivision_depth: u8,
    used_fields: Vec<Field>,
    grouped_fields: Vec<Vec<Field>>,
}

/// Every known field token in `format`, in order of first appearance.
pub fn scan_fields(format: &str) -> Vec<Field> {
    let mut fields = Vec::new();
    for caps in TOKEN_RE.captures_iter(format) {
        if let Some(field) = Field::from_token(&caps[1]) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    fields
}

/// Field tokens per output line. Lines without tokens are dropped.
pub fn group_fields(format: &str) -> Vec<Vec<Field>> {
    format
        .split('\n')
        .map(scan_fields)
        .filter(|line| !line.is_empty())
        .collect()
}

fn unknown_tokens(format: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(format)
        .filter(|caps| Field::from_token(&caps[1]).is_none())
        .map(|caps| caps[1].to_string())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AddressFormat {
    /// Builds a format from its definition, rejecting incomplete or
    /// inconsistent reference data.
    pub fn from_definition(country_code: &str, definition: AddressFormatDefinition) -> Result<Self> {
        let country_code = non_empty(definition.country_code.clone())
            .unwrap_or_else(|| country_code.trim().to_string());
        if country_code.is_empty() {
            return Err(AddressError::definition("?", "country_code is missing"));
        }
        let cc = country_code.as_str();

        let format = non_empty(definition.format)
            .ok_or_else(|| AddressError::definition(cc, "format is missing"))?;
        let local_format = non_empty(definition.local_format);
        let locale = non_empty(definition.locale);

        for layout in std::iter::once(&format).chain(local_format.iter()) {
            let unknown = unknown_tokens(layout);
            if !unknown.is_empty() {
                return Err(AddressError::definition(
                    cc,
                    format!("unknown field tokens: {}", unknown.join(", ")),
                ));
            }
        }

        let used_fields = scan_fields(&format);
        let grouped_fields = group_fields(&format);

        if let Some(local_format) = &local_format {
            if locale.is_none() {
                return Err(AddressError::definition(cc, "local_format requires a locale"));
            }
            let mut local_fields = scan_fields(local_format);
            let mut fields = used_fields.clone();
            local_fields.sort();
            fields.sort();
            if local_fields != fields {
                return Err(AddressError::definition(
                    cc,
                    "local_format must use the same fields as format",
                ));
            }
        }

        for (label, fields) in [
            ("required_fields", &definition.required_fields),
            ("uppercase_fields", &definition.uppercase_fields),
        ] {
            if let Some(field) = fields.iter().find(|f| !used_fields.contains(f)) {
                return Err(AddressError::definition(
                    cc,
                    format!("{} contains '{}' which is not used by the format", label, field),
                ));
            }
        }

        for (field, defined) in [
            (Field::AdministrativeArea, definition.administrative_area_type.is_some()),
            (Field::Locality, definition.locality_type.is_some()),
            (Field::DependentLocality, definition.dependent_locality_type.is_some()),
            (Field::PostalCode, definition.postal_code_type.is_some()),
        ] {
            if defined && !used_fields.contains(&field) {
                return Err(AddressError::definition(
                    cc,
                    format!("a type is defined for '{}' which is not used by the format", field),
                ));
            }
        }

        let used_subdivisions = used_fields.iter().filter(|f| f.is_subdivision()).count();
        if usize::from(definition.subdivision_depth) > used_subdivisions {
            return Err(AddressError::definition(
                cc,
                format!(
                    "subdivision_depth {} exceeds the {} subdivision fields used by the format",
                    definition.subdivision_depth, used_subdivisions
                ),
            ));
        }

        let postal_code_pattern = non_empty(definition.postal_code_pattern)
            .map(|p| PostalCodePattern::new(&p, PatternType::Full))
            .transpose()?;

        let mut required_fields = Vec::new();
        for field in definition.required_fields {
            if !required_fields.contains(&field) {
                required_fields.push(field);
            }
        }
        let mut uppercase_fields = Vec::new();
        for field in definition.uppercase_fields {
            if !uppercase_fields.contains(&field) {
                uppercase_fields.push(field);
            }
        }

        Ok(Self {
            country_code,
            locale,
            format,
            local_format,
            required_fields,
            uppercase_fields,
            administrative_area_type: definition.administrative_area_type,
            locality_type: definition.locality_type,
            dependent_locality_type: definition.dependent_locality_type,
            postal_code_type: definition.postal_code_type,
            postal_code_pattern,
            postal_code_prefix: non_empty(definition.postal_code_prefix),
            subdivision_depth: definition.subdivision_depth,
            used_fields,
            grouped_fields,
        })
    }

    /// The fallback used for countries without a definition.
    pub fn generic() -> Self {
        Self {
            country_code: GENERIC_COUNTRY_CODE.to_string(),
            locale: None,
            format: GENERIC_FORMAT.to_string(),
            local_format: None,
            required_fields: vec![Field::AddressLine1, Field::Locality],
            uppercase_fields: Vec::new(),
            administrative_area_type: None,
            locality_type: Some(LocalityType::City),
            dependent_locality_type: None,
            postal_code_type: None,
            postal_code_pattern: None,
            postal_code_prefix: None,
            subdivision_depth: 0,
            used_fields: scan_fields(GENERIC_FORMAT),
            grouped_fields: group_fields(GENERIC_FORMAT),
        }
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn local_format(&self) -> Option<&str> {
        self.local_format.as_deref()
    }

    /// `local_format` when `locale` matches this format's locale, `format` otherwise.
    pub fn format_for_locale(&self, locale: Option<&str>) -> &str {
        match &self.local_format {
            Some(local_format) if locale::matches_opt(locale, self.locale()) => local_format,
            _ => &self.format,
        }
    }

    pub fn grouped_fields_for_locale(&self, locale: Option<&str>) -> Vec<Vec<Field>> {
        group_fields(self.format_for_locale(locale))
    }

    pub fn required_fields(&self) -> &[Field] {
        &self.required_fields
    }

    pub fn uppercase_fields(&self) -> &[Field] {
        &self.uppercase_fields
    }

    pub fn administrative_area_type(&self) -> Option<AdministrativeAreaType> {
        self.administrative_area_type
    }

    pub fn locality_type(&self) -> Option<LocalityType> {
        self.locality_type
    }

    pub fn dependent_locality_type(&self) -> Option<DependentLocalityType> {
        self.dependent_locality_type
    }

    pub fn postal_code_type(&self) -> Option<PostalCodeType> {
        self.postal_code_type
    }

    pub fn postal_code_pattern(&self) -> Option<&PostalCodePattern> {
        self.postal_code_pattern.as_ref()
    }

    pub fn postal_code_prefix(&self) -> Option<&str> {
        self.postal_code_prefix.as_deref()
    }

    pub fn subdivision_depth(&self) -> u8 {
        self.subdivision_depth
    }

    pub fn used_fields(&self) -> &[Field] {
        &self.used_fields
    }

    pub fn grouped_fields(&self) -> &[Vec<Field>] {
        &self.grouped_fields
    }

    /// Used subdivision fields from the outermost level inwards
    /// (administrative area, locality, dependent locality). This is the
    /// validation walk order, whatever their position in the layout.
    pub fn used_subdivision_fields(&self) -> Vec<Field> {
        Field::subdivision_fields()
            .iter()
            .copied()
            .filter(|f| self.used_fields.contains(f))
            .collect()
    }

    /// Used fields minus the ones the caller hides.
    pub fn used_fields_with(&self, overrides: &FieldOverrides) -> Vec<Field> {
        self.used_fields
            .iter()
            .copied()
            .filter(|f| !overrides.is_hidden(*f))
            .collect()
    }

    /// Base required fields minus hidden/optional overrides, plus forced
    /// required fields. Only used fields can become required.
    pub fn required_fields_with(&self, overrides: &FieldOverrides) -> Vec<Field> {
        self.used_fields
            .iter()
            .copied()
            .filter(|f| self.required_fields.contains(f) || overrides.is_required(*f))
            .filter(|f| !overrides.is_hidden(*f) && !overrides.is_optional(*f))
            .collect()
    }

    pub fn is_uppercase(&self, field: Field) -> bool {
        self.uppercase_fields.contains(&field)
    }
}
