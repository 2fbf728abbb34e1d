//! Relation Registry
//!
//! Holds the append-only history of declared relations. Entries are never
//! removed; a relation leaves the active set when a later entry removes or
//! supersedes it.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::error::{ParseError, RegistryError, Result};
use crate::parser::{self, DeclarationParser};
use crate::relation::{Relation, RelationKey, RelationStatus};
use crate::snapshot::SchemaSnapshot;
use crate::validate::{self, Violation};

/// File extension picked up by [`Registry::load_dir`]
pub const DECLARATION_EXTENSION: &str = "rels";

/// The immutable relation registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    /// All entries in declaration order
    entries: Vec<Relation>,
    /// `retired[i]` is set when a later entry replaces `entries[i]`
    retired: Vec<bool>,
}

/// Entry counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
    /// Live entries replaced by a later declaration
    pub superseded: usize,
}

impl Registry {
    /// Parse declaration text into a registry
    pub fn load(source: &str) -> std::result::Result<Self, ParseError> {
        let entries = parser::parse(source)?;
        let registry = Self::from_entries(entries);
        let fingerprint = registry.fingerprint();
        debug!(
            entries = registry.len(),
            fingerprint = %fingerprint.short(),
            "loaded relation registry"
        );
        Ok(registry)
    }

    /// Load a single declaration file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::load(&content).map_err(|source| RegistryError::ParseInFile {
            file: path.display().to_string(),
            source,
        })
    }

    /// Load every `*.rels` file under a directory, in path order, as one history
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut parser = DeclarationParser::new();
        let mut files = 0usize;

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == DECLARATION_EXTENSION)
                    .unwrap_or(false)
            })
        {
            let path = entry.path();
            let content = fs::read_to_string(path)?;
            parser
                .feed(&content)
                .map_err(|source| RegistryError::ParseInFile {
                    file: path.display().to_string(),
                    source,
                })?;
            files += 1;
        }

        if files == 0 {
            warn!(dir = %dir.display(), "no .{} files found", DECLARATION_EXTENSION);
        }

        let registry = Self::from_entries(parser.finish());
        info!(files, entries = registry.len(), "loaded relation registry from directory");
        Ok(registry)
    }

    /// Load from a file, or from a directory of declaration files
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_file(path)
        }
    }

    /// Build a registry from already-parsed entries in declaration order
    pub fn from_entries(entries: Vec<Relation>) -> Self {
        let retired = compute_retired(&entries);
        Self { entries, retired }
    }

    /// Every entry, including removed and superseded ones
    pub fn entries(&self) -> &[Relation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relations currently in force, in declaration order.
    ///
    /// Each call starts a fresh pass over the registry.
    pub fn active_relations(&self) -> impl Iterator<Item = &Relation> + Clone + '_ {
        self.entries
            .iter()
            .zip(self.retired.iter())
            .filter(|(relation, retired)| !**retired && relation.status.is_live())
            .map(|(relation, _)| relation)
    }

    /// Whether the entry at `index` has been replaced by a later entry
    pub fn is_superseded(&self, index: usize) -> bool {
        self.retired.get(index).copied().unwrap_or(false)
    }

    /// The later entry that replaced `entries()[index]`, if any
    pub fn superseded_by(&self, index: usize) -> Option<&Relation> {
        if !self.is_superseded(index) {
            return None;
        }
        let key = self.entries[index].key();
        self.entries[index + 1..].iter().find(|later| {
            later.key() == key
                || (later.status == RelationStatus::Changed && later.supersedes.as_ref() == Some(&key))
        })
    }

    /// All entries declared for a column pair, oldest first
    pub fn history<'a>(&'a self, key: &'a RelationKey) -> impl Iterator<Item = &'a Relation> + 'a {
        self.entries.iter().filter(move |relation| relation.parent == key.parent && relation.child == key.child)
    }

    /// The active relation for a column pair
    pub fn current(&self, key: &RelationKey) -> Option<&Relation> {
        self.active_relations()
            .find(|relation| relation.parent == key.parent && relation.child == key.child)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for (relation, retired) in self.entries.iter().zip(self.retired.iter()) {
            match relation.status {
                RelationStatus::Active => counts.active += 1,
                RelationStatus::Added => counts.added += 1,
                RelationStatus::Changed => counts.changed += 1,
                RelationStatus::Removed => counts.removed += 1,
            }
            if *retired && relation.status.is_live() {
                counts.superseded += 1;
            }
        }
        counts
    }

    /// Check a snapshot against every active relation
    pub fn validate(&self, snapshot: &SchemaSnapshot) -> Vec<Violation> {
        validate::validate(self, snapshot)
    }

    /// Canonical declaration text. Loading it back yields the same fingerprint.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut section: Option<&str> = None;

        for relation in &self.entries {
            let current = relation.section.as_deref();
            if current != section {
                if let Some(heading) = current {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    let _ = writeln!(out, "# {}", heading);
                }
                section = current;
            }
            let _ = writeln!(out, "{}", relation);
        }

        out
    }

    /// SHA256 over the canonical rendering
    pub fn fingerprint(&self) -> Checksum {
        Checksum::of(&self.render())
    }
}

fn compute_retired(entries: &[Relation]) -> Vec<bool> {
    let mut retired = vec![false; entries.len()];
    let mut latest: HashMap<RelationKey, usize> = HashMap::with_capacity(entries.len());

    for (idx, relation) in entries.iter().enumerate() {
        if let Some(previous) = latest.insert(relation.key(), idx) {
            retired[previous] = true;
        }

        if relation.status == RelationStatus::Changed {
            if let Some(target) = &relation.supersedes {
                for (earlier, entry) in entries[..idx].iter().enumerate() {
                    if entry.parent == target.parent && entry.child == target.child {
                        retired[earlier] = true;
                    }
                }
            }
        }
    }

    retired
}
