use serde::{Deserialize, Serialize};

use crate::{ClientState, MAX_COLOR_LEN, MAX_ID_LEN};

pub const MAX_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: ClientState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("client id is empty")]
    EmptyId,
    #[error("client id is {0} bytes long")]
    IdTooLong(usize),
    #[error("color token {0:?} is invalid")]
    InvalidColor(String),
    #[error("stroke width must be positive")]
    InvalidWidth,
}

impl Snapshot {
    pub fn new(state: ClientState, seq: Option<u64>) -> Self {
        Self { state, seq }
    }

    pub fn supersedes(&self, stored_seq: Option<u64>) -> bool {
        supersedes(self.seq, stored_seq)
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        validate_state(&self.state)
    }
}

/// Discard-if-stale: an incoming snapshot loses only when both sides carry a
/// sequence number and the stored one is newer.
pub fn supersedes(incoming: Option<u64>, stored: Option<u64>) -> bool {
    match (incoming, stored) {
        (Some(incoming), Some(stored)) => incoming >= stored,
        _ => true,
    }
}

pub fn validate_state(state: &ClientState) -> Result<(), SnapshotError> {
    let id = state.id.as_str();
    if id.is_empty() {
        return Err(SnapshotError::EmptyId);
    }
    if id.len() > MAX_ID_LEN {
        return Err(SnapshotError::IdTooLong(id.len()));
    }
    if state.color.is_empty() || state.color.len() > MAX_COLOR_LEN {
        return Err(SnapshotError::InvalidColor(state.color.clone()));
    }
    if state.width == 0 {
        return Err(SnapshotError::InvalidWidth);
    }
    Ok(())
}

fn check_size(payload: &str) -> Result<(), SnapshotError> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(SnapshotError::TooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_BYTES,
        });
    }
    Ok(())
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    let payload = serde_json::to_string(snapshot)?;
    check_size(&payload)?;
    Ok(payload)
}

pub fn encode_state(state: &ClientState) -> Result<String, SnapshotError> {
    let payload = serde_json::to_string(state)?;
    check_size(&payload)?;
    Ok(payload)
}

pub fn decode_snapshot(payload: &str) -> Result<Snapshot, SnapshotError> {
    check_size(payload)?;
    let snapshot = serde_json::from_str::<Snapshot>(payload)?;
    snapshot.validate()?;
    Ok(snapshot)
}

pub fn decode_state(payload: &str) -> Result<ClientState, SnapshotError> {
    decode_snapshot(payload).map(|snapshot| snapshot.state)
}
