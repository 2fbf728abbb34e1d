//! Referential integrity validation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::registry::Registry;
use crate::relation::Relation;
use crate::snapshot::SchemaSnapshot;

/// Why a relation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Child values with no matching parent value
    DanglingReference,
    /// The snapshot does not declare the parent column at all
    UndeclaredParent,
}

/// An integrity breach for one active relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub relation: Relation,
    pub kind: ViolationKind,
    /// Sorted child values absent from the parent column
    pub missing_values: Vec<String>,
    /// One-line description, at most five values listed
    pub detail: String,
}

fn describe(relation: &Relation, kind: ViolationKind, missing: &[String]) -> String {
    let shown: Vec<&str> = missing.iter().take(5).map(String::as_str).collect();
    let more = missing.len().saturating_sub(shown.len());
    let mut values = shown.join(", ");
    if more > 0 {
        values.push_str(&format!(" (+{} more)", more));
    }

    match kind {
        ViolationKind::DanglingReference => format!(
            "{} holds values missing from {}: {}",
            relation.child, relation.parent, values
        ),
        ViolationKind::UndeclaredParent => format!(
            "{} is not in the snapshot; {} references {}",
            relation.parent, relation.child, values
        ),
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}): {}", self.relation.key(), self.relation.line, self.detail)
    }
}

/// Check that each active relation's child values are a subset of its
/// parent values. Relations whose child column is not in the snapshot are
/// skipped.
pub fn validate(registry: &Registry, snapshot: &SchemaSnapshot) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut checked = 0usize;

    for relation in registry.active_relations() {
        let Some(child_values) = snapshot.values(&relation.child) else {
            tracing::trace!(relation = %relation.key(), "child column absent, skipped");
            continue;
        };
        checked += 1;
        if child_values.is_empty() {
            continue;
        }

        let (kind, parent_values) = match snapshot.values(&relation.parent) {
            Some(values) => (ViolationKind::DanglingReference, values),
            None => (ViolationKind::UndeclaredParent, BTreeSet::new()),
        };

        let missing: Vec<String> = child_values.difference(&parent_values).cloned().collect();
        if missing.is_empty() {
            continue;
        }

        tracing::warn!(
            relation = %relation.key(),
            missing = missing.len(),
            "referential integrity violation"
        );
        violations.push(Violation {
            detail: describe(relation, kind, &missing),
            relation: relation.clone(),
            kind,
            missing_values: missing,
        });
    }

    tracing::debug!(checked, violations = violations.len(), "validation finished");
    violations
}

/// Number of active relations whose child column the snapshot declares
pub fn checked_relations(registry: &Registry, snapshot: &SchemaSnapshot) -> usize {
    registry
        .active_relations()
        .filter(|relation| snapshot.values(&relation.child).is_some())
        .count()
}
