//! Golden Tests for the Property Management Relation Log
//!
//! Loads the full declaration history and checks the active set, lint
//! findings, load order and snapshot validation against known answers.

use std::path::{Path, PathBuf};

use relation_registry::lint::{POLYMORPHIC_REFERENCE, SELF_REFERENCE, SUPERSEDED_RELATION};
use relation_registry::{
    lint_registry, ColumnRef, Direction, Registry, RelationGraph, RelationKey, RelationStatus,
    SchemaSnapshot, ValidationReport, ViolationKind,
};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn property_registry() -> Registry {
    Registry::load(include_str!("fixtures/property_management.rels")).unwrap()
}

fn key(parent: &str, child: &str) -> RelationKey {
    let (pt, pc) = parent.split_once('.').unwrap();
    let (ct, cc) = child.split_once('.').unwrap();
    RelationKey::new(ColumnRef::new(pt, pc), ColumnRef::new(ct, cc))
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_full_log_counts() {
    let registry = property_registry();
    assert_eq!(registry.len(), 45);

    let counts = registry.status_counts();
    assert_eq!(counts.removed, 7);
    assert_eq!(counts.changed, 1);
    assert_eq!(counts.added, 2);
    assert_eq!(counts.superseded, 1);
    assert_eq!(registry.active_relations().count(), 37);
}

#[test]
fn test_sections_recorded() {
    let registry = property_registry();
    let first = &registry.entries()[0];
    assert_eq!(
        first.section.as_deref(),
        Some("User and Roles/Permissions/Company Associations")
    );

    let last = registry.entries().last().unwrap();
    assert_eq!(
        last.section.as_deref(),
        Some("Property Assignments and Contract Associations")
    );
}

#[test]
fn test_reverse_declarations() {
    let registry = property_registry();
    let relation = registry
        .current(&key("contract.contract_id", "contract_invoice.contract_id"))
        .unwrap();
    assert_eq!(relation.direction, Direction::Reverse);
    assert_eq!(
        relation.to_string(),
        "contract_invoice.contract_id > contract.contract_id"
    );
}

#[test]
fn test_idempotent_load_and_fingerprint() {
    let a = property_registry();
    let b = Registry::load_file(fixtures_path().join("property_management.rels")).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());

    let reloaded = Registry::load(&a.render()).unwrap();
    assert_eq!(reloaded.fingerprint(), a.fingerprint());
    assert_eq!(reloaded.active_relations().count(), 37);
}

// =============================================================================
// Schema evolution
// =============================================================================

#[test]
fn test_removed_relations_inactive() {
    let registry = property_registry();
    for removed in [
        key("country.country_id", "city.country_id"),
        key("property.property_id", "units.property_id"),
        key("utilities.utility_id", "unit_utilities.utility_id"),
        key("units.property_unit_id", "units_amenities.property_unit_assoc"),
        key("property_status.property_status_id", "property.property_status_id"),
    ] {
        assert!(registry.current(&removed).is_none(), "{} still active", removed);
    }
    assert!(registry
        .active_relations()
        .all(|r| r.status != RelationStatus::Removed));
}

#[test]
fn test_city_reference_moved_to_addresses() {
    let registry = property_registry();
    assert!(registry
        .current(&key("city.city_id", "property.city_id"))
        .is_none());

    let replacement = registry
        .current(&key("addresses.address_id", "property.address_id"))
        .unwrap();
    assert_eq!(replacement.status, RelationStatus::Changed);
    assert_eq!(
        replacement.supersedes,
        Some(key("city.city_id", "property.city_id"))
    );
}

#[test]
fn test_added_relations_active() {
    let registry = property_registry();
    let added: Vec<_> = registry
        .active_relations()
        .filter(|r| r.status == RelationStatus::Added)
        .map(|r| r.child.to_string())
        .collect();
    assert_eq!(
        added,
        vec![
            "unit_utilities.property_unit_assoc",
            "units_amenities.property_unit_assoc"
        ]
    );
}

// =============================================================================
// Lint and graph
// =============================================================================

#[test]
fn test_lint_findings() {
    let result = lint_registry(&property_registry());
    assert!(result.is_clean());

    let mut codes: Vec<_> = result.warnings.iter().map(|w| w.code).collect();
    codes.sort_unstable();
    assert_eq!(
        codes,
        vec![POLYMORPHIC_REFERENCE, SELF_REFERENCE, SUPERSEDED_RELATION]
    );
}

#[test]
fn test_load_order() {
    let graph = RelationGraph::from_registry(&property_registry());
    assert!(graph.cycles().is_empty());
    assert_eq!(graph.self_referencing(), ["message".to_string()]);

    let order = graph.load_order().unwrap();
    let position = |table: &str| order.iter().position(|t| t == table).unwrap();

    assert!(position("city") < position("addresses"));
    assert!(position("addresses") < position("property"));
    assert!(position("property") < position("property_unit_assoc"));
    assert!(position("property_unit_assoc") < position("under_contract"));
    assert!(position("transaction_type") < position("transaction"));
    assert!(position("transaction") < position("contract"));
    assert!(!graph.contains("country"));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_valid_snapshot() {
    let registry = property_registry();
    let snapshot = SchemaSnapshot::load_file(fixtures_path().join("snapshot_valid.json")).unwrap();

    let report = ValidationReport::build(&registry, &snapshot);
    assert!(report.is_success(), "{:?}", report.violations);
    assert_eq!(report.relations_checked, 6);
    assert_eq!(report.active_relations, 37);
}

#[test]
fn test_dangling_role_reference() {
    let registry = property_registry();
    let snapshot =
        SchemaSnapshot::load_file(fixtures_path().join("snapshot_dangling.json")).unwrap();

    let violations = registry.validate(&snapshot);
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0].relation.key(),
        key("role.id", "user_roles.role_id")
    );
    assert_eq!(violations[0].kind, ViolationKind::DanglingReference);
    assert_eq!(violations[0].missing_values, vec!["9"]);
}
