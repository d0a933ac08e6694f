//! Content digest for persisted world-state snapshots.

use serde::{Deserialize, Serialize};

use super::error::HarnessError;

/// SHA-256 digest (lowercase hex) of a persisted environment snapshot.
///
/// Recorded when a world save is written so saved states can be audited and
/// compared across runs. The inner string is private: it is always valid hex
/// produced by [`StateDigest::from_bytes`] or validated via `TryFrom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDigest(String);

impl StateDigest {
    /// Digest the given snapshot bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(data);
        StateDigest(hex::encode(hasher.finalize()))
    }

    /// Full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars), for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for StateDigest {
    type Error = HarnessError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HarnessError::Environment(format!(
                "invalid state digest: {s}"
            )));
        }
        Ok(StateDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for StateDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
