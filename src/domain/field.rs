use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An address component. Serialized with the same camelCase name used as
/// the `%token` inside format strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    AdministrativeArea,
    Locality,
    DependentLocality,
    PostalCode,
    SortingCode,
    AddressLine1,
    AddressLine2,
    AddressLine3,
    Organization,
    GivenName,
    AdditionalName,
    FamilyName,
}

impl Field {
    const ALL: [Field; 12] = [
        Field::AdministrativeArea,
        Field::Locality,
        Field::DependentLocality,
        Field::PostalCode,
        Field::SortingCode,
        Field::AddressLine1,
        Field::AddressLine2,
        Field::AddressLine3,
        Field::Organization,
        Field::GivenName,
        Field::AdditionalName,
        Field::FamilyName,
    ];

    /// Subdivision-capable fields, from the outermost level inwards.
    const SUBDIVISION: [Field; 3] = [
        Field::AdministrativeArea,
        Field::Locality,
        Field::DependentLocality,
    ];

    pub fn all() -> &'static [Field] {
        &Self::ALL
    }

    pub fn subdivision_fields() -> &'static [Field] {
        &Self::SUBDIVISION
    }

    pub fn is_subdivision(&self) -> bool {
        Self::SUBDIVISION.contains(self)
    }

    pub fn token(&self) -> &'static str {
        match self {
            Field::AdministrativeArea => "administrativeArea",
            Field::Locality => "locality",
            Field::DependentLocality => "dependentLocality",
            Field::PostalCode => "postalCode",
            Field::SortingCode => "sortingCode",
            Field::AddressLine1 => "addressLine1",
            Field::AddressLine2 => "addressLine2",
            Field::AddressLine3 => "addressLine3",
            Field::Organization => "organization",
            Field::GivenName => "givenName",
            Field::AdditionalName => "additionalName",
            Field::FamilyName => "familyName",
        }
    }

    pub fn from_token(token: &str) -> Option<Field> {
        Self::ALL.iter().copied().find(|field| field.token() == token)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_token(s.trim()).ok_or_else(|| {
            let known: Vec<&str> = Field::all().iter().map(|f| f.token()).collect();
            format!("unknown field '{}', expected one of: {}", s, known.join(", "))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdministrativeAreaType {
    Area,
    County,
    Department,
    District,
    DoSi,
    Emirate,
    Island,
    Oblast,
    Parish,
    Prefecture,
    Province,
    State,
}

impl AdministrativeAreaType {
    pub fn all() -> &'static [AdministrativeAreaType] {
        use AdministrativeAreaType::*;
        &[
            Area, County, Department, District, DoSi, Emirate, Island, Oblast, Parish, Prefecture,
            Province, State,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalityType {
    City,
    District,
    PostTown,
    Suburb,
}

impl LocalityType {
    pub fn all() -> &'static [LocalityType] {
        &[
            LocalityType::City,
            LocalityType::District,
            LocalityType::PostTown,
            LocalityType::Suburb,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependentLocalityType {
    District,
    Neighborhood,
    VillageTownship,
    Suburb,
    Townland,
}

impl DependentLocalityType {
    pub fn all() -> &'static [DependentLocalityType] {
        use DependentLocalityType::*;
        &[District, Neighborhood, VillageTownship, Suburb, Townland]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostalCodeType {
    Eircode,
    Pin,
    Postal,
    Zip,
}

impl PostalCodeType {
    pub fn all() -> &'static [PostalCodeType] {
        &[
            PostalCodeType::Eircode,
            PostalCodeType::Pin,
            PostalCodeType::Postal,
            PostalCodeType::Zip,
        ]
    }
}

/// How a subdivision's postal code pattern is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// The pattern must match the entire postal code.
    Full,
    /// The pattern must match at the beginning of the postal code.
    #[default]
    Start,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_for_every_field() {
        for field in Field::all() {
            assert_eq!(Field::from_token(field.token()), Some(*field));
            assert_eq!(field.to_string().parse::<Field>().unwrap(), *field);
        }
        assert_eq!(Field::from_token("country"), None);
        assert!("streetName".parse::<Field>().is_err());
    }

    #[test]
    fn test_serde_names_match_tokens() {
        let json = serde_json::to_string(&Field::AddressLine1).unwrap();
        assert_eq!(json, "\"addressLine1\"");

        let parsed: AdministrativeAreaType = serde_json::from_str("\"do_si\"").unwrap();
        assert_eq!(parsed, AdministrativeAreaType::DoSi);
        assert!(serde_json::from_str::<LocalityType>("\"hamlet\"").is_err());
    }

    #[test]
    fn test_pattern_type_defaults_to_start() {
        assert_eq!(PatternType::default(), PatternType::Start);
        assert_eq!(PostalCodeType::all().len(), 4);
        assert!(Field::Locality.is_subdivision());
        assert!(!Field::PostalCode.is_subdivision());
    }
}
