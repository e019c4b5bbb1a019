use std::time::Duration;

use stratboard_shared::{decode_snapshot, encode_snapshot, Snapshot, SnapshotError};

use crate::registry::{ClientRegistry, UpsertOutcome};

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not open")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

pub trait Transport {
    fn is_open(&self) -> bool;
    fn send(&self, payload: &str) -> Result<(), TransportError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Sent { seq: u64 },
    Suppressed,
    Oversized { len: usize },
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub sent: u64,
    pub suppressed: u64,
    pub oversized: u64,
    pub failed: u64,
    pub received: u64,
    pub dropped: u64,
}

pub struct SyncChannel {
    interval: Duration,
    next_seq: u64,
    stats: SyncStats,
    oversize_reported: bool,
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_INTERVAL)
    }
}

impl SyncChannel {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_seq: 0,
            stats: SyncStats::default(),
            oversize_reported: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn tick<T: Transport + ?Sized>(&mut self, registry: &ClientRegistry, transport: &T) -> TickOutcome {
        if !transport.is_open() {
            self.stats.suppressed += 1;
            return TickOutcome::Suppressed;
        }
        let seq = self.next_seq;
        match self.send_snapshot(registry, transport, seq) {
            Ok(()) => {
                self.next_seq += 1;
                self.stats.sent += 1;
                self.oversize_reported = false;
                TickOutcome::Sent { seq }
            }
            Err(SyncError::Encode(SnapshotError::TooLarge { len, max })) => {
                self.stats.oversized += 1;
                if !self.oversize_reported {
                    self.oversize_reported = true;
                    tracing::error!(len, max, "local state exceeds the payload limit; not sending");
                }
                TickOutcome::Oversized { len }
            }
            Err(error) => {
                self.stats.failed += 1;
                tracing::warn!(%error, seq, "snapshot send failed");
                TickOutcome::Failed
            }
        }
    }

    fn send_snapshot<T: Transport + ?Sized>(
        &self,
        registry: &ClientRegistry,
        transport: &T,
        seq: u64,
    ) -> Result<(), SyncError> {
        let snapshot = Snapshot::new(registry.local().state().clone(), Some(seq));
        let payload = encode_snapshot(&snapshot)?;
        transport.send(&payload)?;
        Ok(())
    }

    pub fn receive(&mut self, payload: &str, registry: &mut ClientRegistry) -> Option<UpsertOutcome> {
        self.stats.received += 1;
        let snapshot = match decode_snapshot(payload) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.stats.dropped += 1;
                tracing::warn!(%error, bytes = payload.len(), "dropping malformed snapshot");
                return None;
            }
        };
        let id = snapshot.state.id.clone();
        let outcome = registry.upsert(snapshot);
        match outcome {
            UpsertOutcome::Inserted => tracing::info!(%id, "new client joined"),
            UpsertOutcome::Stale => tracing::debug!(%id, "discarding stale snapshot"),
            _ => tracing::trace!(%id, ?outcome, "snapshot applied"),
        }
        Some(outcome)
    }
}

#[derive(Debug, thiserror::Error)]
enum SyncError {
    #[error(transparent)]
    Encode(#[from] SnapshotError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Clone, Debug)]
pub struct ReconnectBackoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl ReconnectBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(factor).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
