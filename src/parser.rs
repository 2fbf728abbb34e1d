//! Declaration parsing
//!
//! Turns the line-oriented relation log into [`Relation`] records.
//!
//! ```text
//! # Messages and Reminders
//! # message.message_id < message_recipient.message_id
//! # contract_invoice.contract_id > contract.contract_id
//! # utilities.utility_id < unit_utilities.utility_id | removed this
//! # city.city_id < property.city_id | changed to addresses.address_id < property.address_id
//! ```
//!
//! The leading `#` is optional. A `#` line without a relation operator is a
//! section heading.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::error::{ParseError, ParseErrorKind};
use crate::relation::{ColumnRef, Direction, Relation, RelationKey, RelationStatus};

static COLUMN_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)$").expect("valid column regex")
});

/// Outcome of reading the `| status note` tail
#[derive(Debug, PartialEq)]
enum Annotation<'a> {
    Status(RelationStatus, Option<String>),
    ChangedTo(&'a str),
    ChangedFrom(&'a str),
    /// `changed` without a replacement relation, e.g. converted to an enum
    Retired(String),
}

/// Incremental parser. State carries across [`feed`](Self::feed) calls so
/// several files can form one declaration history.
#[derive(Debug, Default)]
pub struct DeclarationParser {
    entries: Vec<Relation>,
    seen: HashSet<(RelationKey, RelationStatus)>,
    declared: HashSet<RelationKey>,
}

impl DeclarationParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one source text. Sections reset at the start of each source.
    pub fn feed(&mut self, source: &str) -> Result<(), ParseError> {
        let mut section: Option<String> = None;

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let commented = trimmed.starts_with('#');
            let body = trimmed.trim_start_matches('#').trim();
            if body.is_empty() {
                continue;
            }

            let (decl, annotation) = match body.split_once('|') {
                Some((decl, note)) => (decl.trim(), Some(note.trim())),
                None => (body, None),
            };

            if !has_operator(decl) {
                if commented {
                    section = Some(body.to_string());
                    continue;
                }
                return Err(ParseError::new(
                    line_no,
                    ParseErrorKind::MissingOperator(decl.to_string()),
                ));
            }

            let (parent, child, direction) =
                parse_pair(decl).map_err(|kind| ParseError::new(line_no, kind))?;

            let mut relation = Relation::new(parent, child);
            relation.direction = direction;
            relation.section = section.clone();
            relation.line = line_no;

            let annotation = match annotation {
                Some(text) => parse_annotation(text).map_err(|kind| ParseError::new(line_no, kind))?,
                None => Annotation::Status(RelationStatus::Active, None),
            };

            match annotation {
                Annotation::Status(status, note) => {
                    relation.status = status;
                    relation.note = note;
                    self.push(relation)?;
                }
                Annotation::Retired(note) => {
                    relation.status = RelationStatus::Removed;
                    relation.note = Some(note);
                    self.push(relation)?;
                }
                Annotation::ChangedFrom(previous) => {
                    let (parent, child, _) =
                        parse_pair(previous).map_err(|kind| ParseError::new(line_no, kind))?;
                    let previous = RelationKey::new(parent, child);
                    if !self.declared.contains(&previous) {
                        return Err(ParseError::new(
                            line_no,
                            ParseErrorKind::UnknownSupersedes(previous),
                        ));
                    }
                    relation.status = RelationStatus::Changed;
                    relation.supersedes = Some(previous);
                    self.push(relation)?;
                }
                Annotation::ChangedTo(replacement) => {
                    let (parent, child, direction) =
                        parse_pair(replacement).map_err(|kind| ParseError::new(line_no, kind))?;
                    let mut next = Relation::new(parent, child);
                    next.direction = direction;
                    next.status = RelationStatus::Changed;
                    next.supersedes = Some(relation.key());
                    next.section = section.clone();
                    next.line = line_no;

                    // Annotating an earlier declaration only appends its replacement
                    if !self.declared.contains(&relation.key()) {
                        self.push(relation)?;
                    }
                    self.push(next)?;
                }
            }
        }

        Ok(())
    }

    fn push(&mut self, relation: Relation) -> Result<(), ParseError> {
        let key = relation.key();
        if !self.seen.insert((key.clone(), relation.status)) {
            return Err(ParseError::new(relation.line, ParseErrorKind::Duplicate(key)));
        }
        tracing::trace!(relation = %relation, line = relation.line, "declared");
        self.declared.insert(key);
        self.entries.push(relation);
        Ok(())
    }

    /// Entries in declaration order
    pub fn finish(self) -> Vec<Relation> {
        self.entries
    }
}

/// Parse a whole source text in one go
pub fn parse(source: &str) -> Result<Vec<Relation>, ParseError> {
    let mut parser = DeclarationParser::new();
    parser.feed(source)?;
    Ok(parser.finish())
}

fn has_operator(text: &str) -> bool {
    text.contains('<') || text.contains('>')
}

/// Parse `a.b < c.d` or `c.d > a.b` into (parent, child, direction)
fn parse_pair(text: &str) -> Result<(ColumnRef, ColumnRef, Direction), ParseErrorKind> {
    let (idx, op) = text
        .char_indices()
        .find(|(_, c)| *c == '<' || *c == '>')
        .ok_or_else(|| ParseErrorKind::MissingOperator(text.to_string()))?;

    let left = parse_column(&text[..idx])?;
    let right = parse_column(&text[idx + op.len_utf8()..])?;

    Ok(match op {
        '<' => (left, right, Direction::Forward),
        _ => (right, left, Direction::Reverse),
    })
}

fn parse_column(text: &str) -> Result<ColumnRef, ParseErrorKind> {
    let text = text.trim();
    let captures = COLUMN_REF
        .captures(text)
        .ok_or_else(|| ParseErrorKind::BadColumnRef(text.to_string()))?;
    Ok(ColumnRef::new(&captures[1], &captures[2]))
}

fn parse_annotation(text: &str) -> Result<Annotation<'_>, ParseErrorKind> {
    if text.is_empty() {
        return Ok(Annotation::Status(RelationStatus::Active, None));
    }

    let (word, rest) = match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    };
    let note = (!rest.is_empty()).then(|| rest.to_string());

    match word.to_ascii_lowercase().as_str() {
        "active" => Ok(Annotation::Status(RelationStatus::Active, note)),
        "added" | "add" => Ok(Annotation::Status(RelationStatus::Added, note)),
        "removed" | "remove" => Ok(Annotation::Status(RelationStatus::Removed, note)),
        "changed" | "change" => {
            if !has_operator(rest) {
                return Ok(Annotation::Retired(text.to_string()));
            }
            if let Some(previous) = strip_word(rest, "from") {
                Ok(Annotation::ChangedFrom(previous))
            } else {
                Ok(Annotation::ChangedTo(strip_word(rest, "to").unwrap_or(rest)))
            }
        }
        _ => Err(ParseErrorKind::UnknownStatus(word.to_string())),
    }
}

fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let (head, tail) = text.split_once(char::is_whitespace)?;
    head.eq_ignore_ascii_case(word).then(|| tail.trim())
}
