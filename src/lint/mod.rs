//! Relation Linting
//!
//! Flags declarations that are legal but contradictory or worth a second look.
//!
//! ## Lints
//! 1. **Contradictory Direction**: two active relations point the same column pair both ways (error)
//! 2. **Polymorphic Reference**: one child column references several parent columns (warning)
//! 3. **Self Reference**: a table references itself (warning)
//! 4. **Reference Cycle**: tables reference each other in a loop (warning)
//! 5. **Superseded Relation**: an entry replaced by a `changed` declaration (warning)

use std::collections::{BTreeMap, HashSet};

use crate::graph::RelationGraph;
use crate::registry::Registry;
use crate::relation::{ColumnRef, RelationKey, RelationStatus};

pub const CONTRADICTORY_DIRECTION: &str = "CONTRADICTORY_DIRECTION";
pub const POLYMORPHIC_REFERENCE: &str = "POLYMORPHIC_REFERENCE";
pub const SELF_REFERENCE: &str = "SELF_REFERENCE";
pub const REFERENCE_CYCLE: &str = "REFERENCE_CYCLE";
pub const SUPERSEDED_RELATION: &str = "SUPERSEDED_RELATION";

/// Result of linting a registry
#[derive(Debug, Default)]
pub struct LintResult {
    pub errors: Vec<LintError>,
    pub warnings: Vec<LintWarning>,
}

impl LintResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug)]
pub struct LintError {
    pub code: &'static str,
    pub message: String,
    /// Source line, or `tables` for graph-level findings
    pub location: String,
}

#[derive(Debug)]
pub struct LintWarning {
    pub code: &'static str,
    pub message: String,
    pub location: String,
}

/// The registry linter
#[derive(Debug, Default)]
pub struct RelationLinter {
    /// Codes to suppress
    allowed: HashSet<String>,
}

impl RelationLinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the given lint codes
    pub fn allow<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn lint(&self, registry: &Registry) -> LintResult {
        let mut result = LintResult::default();

        self.check_contradictions(registry, &mut result);
        self.check_polymorphic(registry, &mut result);
        self.check_self_references(registry, &mut result);
        self.check_cycles(registry, &mut result);
        self.check_superseded(registry, &mut result);

        result.errors.retain(|e| !self.allowed.contains(e.code));
        result.warnings.retain(|w| !self.allowed.contains(w.code));
        result
    }

    fn check_contradictions(&self, registry: &Registry, result: &mut LintResult) {
        let active: HashSet<RelationKey> = registry.active_relations().map(|r| r.key()).collect();

        for relation in registry.active_relations() {
            let key = relation.key();
            // Report each pair once, from the side sorting first
            if key.parent >= key.child {
                continue;
            }
            if active.contains(&key.reversed()) {
                result.errors.push(LintError {
                    code: CONTRADICTORY_DIRECTION,
                    message: format!(
                        "{} and {} reference each other. Pick one direction.",
                        key.parent, key.child
                    ),
                    location: format!("line {}", relation.line),
                });
            }
        }
    }

    fn check_polymorphic(&self, registry: &Registry, result: &mut LintResult) {
        let mut parents: BTreeMap<&ColumnRef, Vec<(&ColumnRef, usize)>> = BTreeMap::new();
        for relation in registry.active_relations() {
            parents
                .entry(&relation.child)
                .or_default()
                .push((&relation.parent, relation.line));
        }

        for (child, targets) in parents {
            if targets.len() < 2 {
                continue;
            }
            let names: Vec<String> = targets.iter().map(|(parent, _)| parent.to_string()).collect();
            result.warnings.push(LintWarning {
                code: POLYMORPHIC_REFERENCE,
                message: format!(
                    "{} references {} parents: {}. A single column cannot carry a foreign key to each.",
                    child,
                    targets.len(),
                    names.join(", ")
                ),
                location: format!("line {}", targets[0].1),
            });
        }
    }

    fn check_self_references(&self, registry: &Registry, result: &mut LintResult) {
        for relation in registry.active_relations().filter(|r| r.is_self_reference()) {
            result.warnings.push(LintWarning {
                code: SELF_REFERENCE,
                message: format!(
                    "{} references its own table through {}. Rows must be inserted parent-first.",
                    relation.parent.table, relation.child
                ),
                location: format!("line {}", relation.line),
            });
        }
    }

    fn check_cycles(&self, registry: &Registry, result: &mut LintResult) {
        for group in RelationGraph::from_registry(registry).cycles() {
            result.warnings.push(LintWarning {
                code: REFERENCE_CYCLE,
                message: format!("Tables reference each other in a loop: {}", group.join(", ")),
                location: "tables".to_string(),
            });
        }
    }

    fn check_superseded(&self, registry: &Registry, result: &mut LintResult) {
        for (idx, relation) in registry.entries().iter().enumerate() {
            if !relation.status.is_live() {
                continue;
            }
            let Some(replacement) = registry.superseded_by(idx) else {
                continue;
            };
            if replacement.status != RelationStatus::Changed {
                continue;
            }
            result.warnings.push(LintWarning {
                code: SUPERSEDED_RELATION,
                message: format!(
                    "{} was replaced by {} (line {})",
                    relation.key(),
                    replacement.key(),
                    replacement.line
                ),
                location: format!("line {}", relation.line),
            });
        }
    }
}

/// Lint with every check enabled
pub fn lint_registry(registry: &Registry) -> LintResult {
    RelationLinter::new().lint(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contradictory_direction() {
        let registry = Registry::load(
            "documents.document_number > contract_documents.document_number\n\
             documents.document_number < contract_documents.document_number",
        )
        .unwrap();
        let result = lint_registry(&registry);
        assert_eq!(
            result.errors.iter().filter(|e| e.code == CONTRADICTORY_DIRECTION).count(),
            1
        );
        assert!(!result.is_clean());
    }

    #[test]
    fn test_polymorphic_reference() {
        let registry = Registry::load(
            "# entity_address.entity_id > users.user_id\n\
             # entity_address.entity_id > accounts.account_id",
        )
        .unwrap();
        let result = lint_registry(&registry);
        let warning = result
            .warnings
            .iter()
            .find(|w| w.code == POLYMORPHIC_REFERENCE)
            .unwrap();
        assert!(warning.message.contains("entity_address.entity_id references 2 parents"));
        assert_eq!(warning.location, "line 1");
        assert!(result.is_clean());
    }

    #[test]
    fn test_self_reference() {
        let registry = Registry::load("message.message_id < message.parent_message_id").unwrap();
        let result = lint_registry(&registry);
        assert!(result.warnings.iter().any(|w| w.code == SELF_REFERENCE));
    }

    #[test]
    fn test_reference_cycle() {
        let registry = Registry::load("a.id < b.a_id\nb.id < a.b_id").unwrap();
        let result = lint_registry(&registry);
        assert!(result.warnings.iter().any(|w| w.code == REFERENCE_CYCLE));
    }

    #[test]
    fn test_superseded_relation() {
        let registry = Registry::load(
            "city.city_id < property.city_id | changed to addresses.address_id < property.address_id",
        )
        .unwrap();
        let result = lint_registry(&registry);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, SUPERSEDED_RELATION);
    }

    #[test]
    fn test_allowed_codes_suppressed() {
        let registry = Registry::load("message.message_id < message.parent_message_id").unwrap();
        let result = RelationLinter::new().allow([SELF_REFERENCE]).lint(&registry);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_clean_registry() {
        let registry = Registry::load(
            "role.id < user_roles.role_id\nusers.user_id < user_roles.user_id",
        )
        .unwrap();
        let result = lint_registry(&registry);
        assert!(result.is_clean());
        assert!(!result.has_warnings());
    }
}
