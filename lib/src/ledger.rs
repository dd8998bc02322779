use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// One delivered report, keyed in the ledger by its fingerprint.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SentRecord {
    pub file_name: String,
    pub time_created: String,
    pub sent_at: DateTime<Utc>,
}

/// Deterministic dedupe key for an object: UUID v5 over the object
/// name and the canonical (RFC 3339) form of its creation timestamp.
pub fn fingerprint(name: &str, created_at: &DateTime<Utc>) -> String {
    let key = format!("{}_{}", name, created_at.to_rfc3339());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

/// Persisted record of previously dispatched fingerprints. The whole
/// map is loaded at startup and written back on every insert, via a
/// temp file and rename so a crash mid-write cannot corrupt the
/// previous ledger. Append-only in practice; there is no deletion
/// path. Concurrent writers are not guarded against; the scheduler
/// must not overlap runs.
pub struct Ledger {
    path: PathBuf,
    entries: HashMap<String, SentRecord>,
}

impl Ledger {
    /// A missing or unreadable ledger file yields an empty ledger with
    /// a warning; the worst outcome of a lost ledger is one duplicate
    /// email, not a failed run.
    pub fn load<P: AsRef<Path>>(path: P) -> Ledger {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Failed to parse ledger {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) => {
                log::warn!("Failed to read ledger {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Ledger { path, entries }
    }

    pub fn is_sent(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a delivery and persist the full ledger immediately.
    pub fn mark_sent(
        &mut self,
        fingerprint: &str,
        name: &str,
        created_at: &DateTime<Utc>,
    ) -> Result<(), Error> {
        self.entries.insert(
            fingerprint.to_string(),
            SentRecord {
                file_name: name.to_string(),
                time_created: created_at.to_rfc3339(),
                sent_at: Utc::now(),
            },
        );

        self.persist()?;
        log::info!("Ledger updated: {} marked as sent", name);

        Ok(())
    }

    fn persist(&self) -> Result<(), Error> {
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::Ledger(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)
            .map_err(|e| Error::Ledger(format!("{}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Ledger(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }
}
