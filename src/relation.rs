//! Relation types and structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `table.column` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// How a declaration was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `parent.column < child.column`
    Forward,
    /// `child.column > parent.column`
    Reverse,
}

impl Direction {
    pub fn operator(&self) -> char {
        match self {
            Direction::Forward => '<',
            Direction::Reverse => '>',
        }
    }
}

/// Lifecycle status of a declared relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationStatus {
    Active,
    Removed,
    Changed,
    Added,
}

impl RelationStatus {
    /// Keyword used in the trailing `| status note` of a declaration
    pub fn keyword(&self) -> &'static str {
        match self {
            RelationStatus::Active => "active",
            RelationStatus::Removed => "removed",
            RelationStatus::Changed => "changed",
            RelationStatus::Added => "added",
        }
    }

    /// Whether an entry with this status can enforce integrity at all
    pub fn is_live(&self) -> bool {
        !matches!(self, RelationStatus::Removed)
    }
}

impl fmt::Display for RelationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Identity of a relation: the (parent, child) column pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationKey {
    pub parent: ColumnRef,
    pub child: ColumnRef,
}

impl RelationKey {
    pub fn new(parent: ColumnRef, child: ColumnRef) -> Self {
        Self { parent, child }
    }

    /// The same column pair with parent and child swapped
    pub fn reversed(&self) -> Self {
        Self {
            parent: self.child.clone(),
            child: self.parent.clone(),
        }
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} < {}", self.parent, self.child)
    }
}

/// A single declared foreign-key style reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Referenced (parent) column
    pub parent: ColumnRef,
    /// Referencing (child) column
    pub child: ColumnRef,
    pub status: RelationStatus,
    /// Relation this entry replaces; always set for `changed` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<RelationKey>,
    pub direction: Direction,
    /// Free text following the status keyword
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Heading the declaration appeared under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// 1-based source line
    pub line: usize,
}

impl Relation {
    /// Create an active, forward relation
    pub fn new(parent: ColumnRef, child: ColumnRef) -> Self {
        Self {
            parent,
            child,
            status: RelationStatus::Active,
            supersedes: None,
            direction: Direction::Forward,
            note: None,
            section: None,
            line: 0,
        }
    }

    pub fn key(&self) -> RelationKey {
        RelationKey::new(self.parent.clone(), self.child.clone())
    }

    pub fn parent_table(&self) -> &str {
        &self.parent.table
    }

    pub fn parent_column(&self) -> &str {
        &self.parent.column
    }

    pub fn child_table(&self) -> &str {
        &self.child.table
    }

    pub fn child_column(&self) -> &str {
        &self.child.column
    }

    pub fn is_self_reference(&self) -> bool {
        self.parent.table == self.child.table
    }
}

/// Canonical declaration text, without the leading comment marker
impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = match self.direction {
            Direction::Forward => (&self.parent, &self.child),
            Direction::Reverse => (&self.child, &self.parent),
        };
        write!(f, "{} {} {}", left, self.direction.operator(), right)?;

        match (&self.status, &self.supersedes, &self.note) {
            (RelationStatus::Active, _, None) => Ok(()),
            (RelationStatus::Changed, Some(previous), _) => {
                write!(f, " | changed from {}", previous)
            }
            (status, _, Some(note)) => write!(f, " | {} {}", status, note),
            (status, _, None) => write!(f, " | {}", status),
        }
    }
}
