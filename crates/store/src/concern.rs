//! Write-concern policy
//!
//! Transition writes must be durable before they are acknowledged,
//! otherwise recovery's "trust the persisted copy" step is unsound. A
//! concern that acknowledges writes without journaling or filesystem sync
//! is rejected at configuration time, never at write time.

use std::fmt;
use tandem_core::{Error, Result};

/// How many replicas must acknowledge a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgment {
    /// A majority of the replica set
    Majority,
    /// A fixed number of nodes
    Nodes(u32),
}

impl fmt::Display for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acknowledgment::Majority => f.write_str("majority"),
            Acknowledgment::Nodes(n) => write!(f, "{}", n),
        }
    }
}

/// Durability policy applied to every coordinator write and remove.
///
/// Validated at construction: journaled writes or disk sync must be
/// enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConcern {
    ack: Acknowledgment,
    journal: bool,
    fsync: bool,
}

impl WriteConcern {
    /// A write concern with the given settings.
    ///
    /// Fails with [`Error::Domain`] unless journaling or fsync is
    /// enabled.
    pub fn new(ack: Acknowledgment, journal: bool, fsync: bool) -> Result<Self> {
        if !journal && !fsync {
            return Err(Error::Domain(
                "journaled writes (journal) or disk sync (fsync) must be enabled".to_string(),
            ));
        }
        Ok(Self { ack, journal, fsync })
    }

    /// The default policy: majority acknowledgment with journaling.
    pub fn majority_journaled() -> Self {
        Self {
            ack: Acknowledgment::Majority,
            journal: true,
            fsync: false,
        }
    }

    /// Replica acknowledgment requirement.
    pub fn ack(&self) -> Acknowledgment {
        self.ack
    }

    /// Whether writes wait for the journal.
    pub fn journal(&self) -> bool {
        self.journal
    }

    /// Whether writes wait for a filesystem sync.
    pub fn fsync(&self) -> bool {
        self.fsync
    }

    /// True when an acknowledged write is guaranteed durable.
    pub fn is_durable(&self) -> bool {
        self.journal || self.fsync
    }
}

impl Default for WriteConcern {
    fn default() -> Self {
        Self::majority_journaled()
    }
}

impl fmt::Display for WriteConcern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "w={} journal={} fsync={}",
            self.ack, self.journal, self.fsync
        )
    }
}
