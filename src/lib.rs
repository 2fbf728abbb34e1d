//! Relation Registry
//!
//! An append-only registry of foreign-key style relations between table
//! columns, with referential integrity validation of schema snapshots.
//!
//! ## Features
//!
//! - **Declaration Log**: One relation per line, `parent.column < child.column`
//!   (or `child.column > parent.column`), with `| removed`, `| added` and
//!   `| changed ...` annotations recording schema evolution
//! - **Immutable History**: Entries are never deleted; removals and changes are
//!   appended and retire earlier entries
//! - **Integrity Validation**: Child column values must be a subset of parent values
//! - **Linting**: Contradictory, polymorphic, self-referencing and cyclic relations
//! - **Fingerprints**: SHA256 over the canonical rendering
//!
//! ## Example
//!
//! ```
//! use relation_registry::{Registry, SchemaSnapshot};
//!
//! let registry = Registry::load("# role.id < user_roles.role_id").unwrap();
//! let snapshot = SchemaSnapshot::new()
//!     .with_column("role", "id", vec![1, 2])
//!     .with_column("user_roles", "role_id", vec![1, 3]);
//!
//! let violations = registry.validate(&snapshot);
//! assert_eq!(violations.len(), 1);
//! assert_eq!(violations[0].missing_values, vec!["3"]);
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod graph;
pub mod lint;
pub mod parser;
pub mod registry;
pub mod relation;
pub mod report;
pub mod snapshot;
pub mod validate;

pub use checksum::Checksum;
pub use config::{OutputFormat, RelationsConfig};
pub use error::{ParseError, ParseErrorKind, RegistryError, Result};
pub use graph::RelationGraph;
pub use lint::{lint_registry, LintResult, RelationLinter};
pub use registry::{Registry, StatusCounts};
pub use relation::{ColumnRef, Direction, Relation, RelationKey, RelationStatus};
pub use report::ValidationReport;
pub use snapshot::SchemaSnapshot;
pub use validate::{Violation, ViolationKind};
