//! Checksum utilities for registry fingerprints

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 checksum of declaration text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from text
    pub fn of(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_checksum_is_lowercase_sha256() {
        let checksum = Checksum::of("users.user_id < message.sender_id");
        assert_eq!(checksum.as_str().len(), 64);
        assert!(checksum
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(checksum.short(), &checksum.as_str()[..12]);
        assert_eq!(checksum, Checksum::from_bytes(b"users.user_id < message.sender_id"));
    }

    #[test]
    fn test_fingerprint_ignores_layout() {
        let compact =
            Registry::load("role.id < user_roles.role_id\nusers.user_id < user_roles.user_id")
                .unwrap();
        let spaced = Registry::load(
            "\n#   role.id  <  user_roles.role_id\n\n\nusers.user_id < user_roles.user_id\n",
        )
        .unwrap();
        assert_ne!(compact, spaced);
        assert_eq!(compact.fingerprint(), spaced.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_sections_and_status() {
        let plain = Registry::load("role.id < user_roles.role_id").unwrap();
        let headed = Registry::load("# Roles\nrole.id < user_roles.role_id").unwrap();
        let removed = Registry::load("role.id < user_roles.role_id | removed").unwrap();

        assert_ne!(plain.fingerprint(), headed.fingerprint());
        assert_ne!(plain.fingerprint(), removed.fingerprint());
        assert_ne!(headed.fingerprint(), removed.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_declaration_order() {
        let a = Registry::load("role.id < user_roles.role_id\nusers.user_id < user_roles.user_id");
        let b = Registry::load("users.user_id < user_roles.user_id\nrole.id < user_roles.role_id");
        assert_ne!(a.unwrap().fingerprint(), b.unwrap().fingerprint());
    }
}
