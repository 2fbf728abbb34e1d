//! Validation reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::config::OutputFormat;
use crate::registry::Registry;
use crate::snapshot::SchemaSnapshot;
use crate::validate::{self, Violation};

/// Structured outcome of validating one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    /// Fingerprint of the registry the snapshot was checked against
    pub fingerprint: Checksum,
    pub active_relations: usize,
    /// Active relations whose child column the snapshot declares
    pub relations_checked: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn build(registry: &Registry, snapshot: &SchemaSnapshot) -> Self {
        Self {
            generated_at: Utc::now(),
            fingerprint: registry.fingerprint(),
            active_relations: registry.active_relations().count(),
            relations_checked: validate::checked_relations(registry, snapshot),
            violations: registry.validate(snapshot),
        }
    }

    pub fn is_success(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn to_json(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(self),
            OutputFormat::Compact => serde_json::to_string(self),
        }
    }
}
