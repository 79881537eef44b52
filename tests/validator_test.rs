use postal_addressing::{
    Address, AddressValidator, Field, FieldOverride, FieldOverrides, LocalStorage,
    SubdivisionRepository, Violation, ViolationKind,
};
use std::sync::Arc;

fn validator() -> AddressValidator<LocalStorage> {
    let storage = LocalStorage::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"));
    AddressValidator::new(Arc::new(SubdivisionRepository::with_storage(storage)))
}

fn us_address() -> Address {
    Address::new("US")
        .with(Field::AdministrativeArea, "CA")
        .with(Field::Locality, "Mountain View")
        .with(Field::PostalCode, "94025")
        .with(Field::AddressLine1, "1234 Somewhere")
}

fn taichung_address() -> Address {
    Address::new("CN")
        .with(Field::AdministrativeArea, "Taiwan Sheng")
        .with(Field::Locality, "Taichung City")
        .with(Field::DependentLocality, "Xitun District")
        .with(Field::PostalCode, "407")
        .with(Field::AddressLine1, "12345 Yitiao Lu")
}

fn validate(address: &Address) -> Vec<Violation> {
    validator().validate(address, &FieldOverrides::new()).unwrap()
}

#[test]
fn test_valid_us_address() {
    assert_eq!(validate(&us_address()), vec![]);
}

#[test]
fn test_missing_required_fields() {
    let address = Address::new("US")
        .with(Field::AdministrativeArea, "CA")
        .with(Field::PostalCode, "90961");

    assert_eq!(
        validate(&address),
        vec![
            Violation::new(Field::AddressLine1, ViolationKind::Required),
            Violation::new(Field::Locality, ViolationKind::Required),
        ]
    );
}

#[test]
fn test_whitespace_counts_as_missing() {
    let address = us_address().with(Field::Locality, "   ");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::Locality, ViolationKind::Required)]
    );
}

#[test]
fn test_unused_field_must_be_blank() {
    let address = us_address().with(Field::DependentLocality, "Old Mountain View");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::DependentLocality, ViolationKind::Blank)]
    );
}

#[test]
fn test_unknown_state_is_invalid() {
    let address = us_address().with(Field::AdministrativeArea, "XX");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::AdministrativeArea, ViolationKind::Invalid)]
    );
}

#[test]
fn test_postal_code_must_match_state() {
    let address = us_address().with(Field::PostalCode, "10001");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::PostalCode, ViolationKind::Invalid)]
    );

    let relaxed = validator().with_extended_postal_validation(false);
    assert!(relaxed.validate(&address, &FieldOverrides::new()).unwrap().is_empty());
}

#[test]
fn test_postal_code_must_match_country_pattern() {
    let address = us_address().with(Field::PostalCode, "9402");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::PostalCode, ViolationKind::Invalid)]
    );
}

#[test]
fn test_taiwan_hierarchy_is_valid() {
    assert_eq!(validate(&taichung_address()), vec![]);
}

#[test]
fn test_taiwan_hierarchy_with_local_codes() {
    let address = taichung_address()
        .with(Field::AdministrativeArea, "台湾省")
        .with(Field::Locality, "台中市")
        .with(Field::DependentLocality, "西屯区");
    assert_eq!(validate(&address), vec![]);
}

#[test]
fn test_unknown_dependent_locality_is_invalid() {
    let address = taichung_address().with(Field::DependentLocality, "Atlantis");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::DependentLocality, ViolationKind::Invalid)]
    );
}

#[test]
fn test_full_subdivision_pattern_overrides_country_pattern() {
    // 404000 satisfies the country pattern (six digits) and the city's
    // start pattern, but not the province's full pattern.
    let address = taichung_address()
        .with(Field::DependentLocality, "")
        .with(Field::PostalCode, "404000");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::PostalCode, ViolationKind::Invalid)]
    );
}

#[test]
fn test_mainland_address_uses_country_pattern() {
    let address = Address::new("CN")
        .with(Field::AdministrativeArea, "Beijing Shi")
        .with(Field::Locality, "Dongcheng Qu")
        .with(Field::PostalCode, "100010")
        .with(Field::AddressLine1, "1 Chang'an Jie");

    // Beijing Shi has no children, so the locality is not checked.
    assert_eq!(validate(&address), vec![]);

    let wrong_prefix = address.clone().with(Field::PostalCode, "200010");
    assert_eq!(
        validate(&wrong_prefix),
        vec![Violation::new(Field::PostalCode, ViolationKind::Invalid)]
    );
}

#[test]
fn test_overrides() {
    let overrides = FieldOverrides::new()
        .with(Field::PostalCode, FieldOverride::Hidden)
        .with(Field::Organization, FieldOverride::Required);

    let address = us_address();
    let violations = validator().validate(&address, &overrides).unwrap();
    assert_eq!(
        violations,
        vec![
            Violation::new(Field::Organization, ViolationKind::Required),
            Violation::new(Field::PostalCode, ViolationKind::Blank),
        ]
    );

    let optional = FieldOverrides::new().with(Field::PostalCode, FieldOverride::Optional);
    let address = us_address().with(Field::PostalCode, "");
    assert!(validator().validate(&address, &optional).unwrap().is_empty());
}

#[test]
fn test_country_without_subdivisions() {
    let address = Address::new("CH")
        .with(Field::AddressLine1, "Bahnhofstrasse 1")
        .with(Field::Locality, "Zürich")
        .with(Field::PostalCode, "8001");
    assert_eq!(validate(&address), vec![]);

    let address = address.with(Field::AdministrativeArea, "ZH");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::AdministrativeArea, ViolationKind::Blank)]
    );
}

#[test]
fn test_unknown_country_uses_generic_rules() {
    let address = Address::new("XX").with(Field::AddressLine1, "1 Main Street");
    assert_eq!(
        validate(&address),
        vec![Violation::new(Field::Locality, ViolationKind::Required)]
    );
}
