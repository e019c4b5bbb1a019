use std::sync::Arc;

use stratboard_shared::{decode_snapshot, supersedes, ClientId, SnapshotError};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::state::{Room, StoredSnapshot, MAX_CLIENTS_PER_ROOM};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Invalid(#[from] SnapshotError),
    #[error("stale snapshot from {id}")]
    Stale { id: ClientId },
    #[error("room already tracks {MAX_CLIENTS_PER_ROOM} clients")]
    RoomFull,
}

pub struct Incoming {
    pub id: ClientId,
    pub seq: Option<u64>,
    pub payload: Arc<str>,
}

pub fn decode_incoming(payload: &str) -> Result<Incoming, RelayError> {
    let snapshot = decode_snapshot(payload)?;
    Ok(Incoming {
        id: snapshot.state.id,
        seq: snapshot.seq,
        payload: Arc::from(payload),
    })
}

pub fn record(room: &mut Room, incoming: Incoming) -> Result<Arc<str>, RelayError> {
    let Incoming { id, seq, payload } = incoming;
    match room.latest.get(&id) {
        Some(stored) if !supersedes(seq, stored.seq) => {
            return Err(RelayError::Stale { id });
        }
        None if room.latest.len() >= MAX_CLIENTS_PER_ROOM => return Err(RelayError::RoomFull),
        _ => {}
    }
    room.latest.insert(
        id,
        StoredSnapshot {
            seq,
            payload: payload.clone(),
        },
    );
    Ok(payload)
}

pub fn replay(room: &Room) -> Vec<Arc<str>> {
    room.latest
        .values()
        .map(|stored| stored.payload.clone())
        .collect()
}

pub async fn broadcast_except(room: &Arc<RwLock<Room>>, sender: Uuid, payload: Arc<str>) {
    let mut stale = Vec::new();
    {
        let room = room.read().await;
        for (id, tx) in room.peers.iter() {
            if *id == sender {
                continue;
            }
            if tx.send(payload.clone()).is_err() {
                stale.push(*id);
            }
        }
    }

    if !stale.is_empty() {
        let mut room = room.write().await;
        for id in stale {
            room.peers.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratboard_shared::{encode_snapshot, ClientState, Point, Snapshot, Stroke};
    use tokio::sync::mpsc;

    fn accept_snapshot(room: &mut Room, payload: &str) -> Result<Arc<str>, RelayError> {
        record(room, decode_incoming(payload)?)
    }

    fn payload(id: &str, seq: Option<u64>, points: usize) -> String {
        let mut state = ClientState::new(ClientId::new(id));
        state.strokes.push(Stroke::new(
            (0..points).map(|i| Point::new(i as f64, 0.0)).collect(),
        ));
        encode_snapshot(&Snapshot::new(state, seq)).unwrap()
    }

    #[test]
    fn latest_snapshot_wins() {
        let mut room = Room::new();
        accept_snapshot(&mut room, &payload("a", Some(1), 3)).unwrap();
        accept_snapshot(&mut room, &payload("a", Some(2), 5)).unwrap();
        assert_eq!(room.latest.len(), 1);
        assert_eq!(room.latest[&ClientId::new("a")].seq, Some(2));
        assert_eq!(replay(&room).len(), 1);
    }

    #[test]
    fn stale_snapshot_is_rejected() {
        let mut room = Room::new();
        accept_snapshot(&mut room, &payload("a", Some(4), 3)).unwrap();
        let result = accept_snapshot(&mut room, &payload("a", Some(3), 9));
        assert!(matches!(result, Err(RelayError::Stale { .. })));
        assert_eq!(room.latest[&ClientId::new("a")].seq, Some(4));

        // Senders without a sequence always replace.
        accept_snapshot(&mut room, &payload("a", None, 2)).unwrap();
        assert_eq!(room.latest[&ClientId::new("a")].seq, None);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let mut room = Room::new();
        for bad in ["", "{}", "not json", r#"{"id":"","color":"red","width":1,"strokes":[]}"#] {
            assert!(matches!(
                accept_snapshot(&mut room, bad),
                Err(RelayError::Invalid(_))
            ));
        }
        assert!(room.latest.is_empty());
    }

    #[test]
    fn decoded_payload_is_checked_when_recorded() {
        let older = decode_incoming(&payload("a", Some(1), 3)).unwrap();
        assert_eq!(older.id, ClientId::new("a"));
        assert_eq!(older.seq, Some(1));

        let mut room = Room::new();
        accept_snapshot(&mut room, &payload("a", Some(2), 4)).unwrap();
        assert!(matches!(record(&mut room, older), Err(RelayError::Stale { .. })));
        assert_eq!(room.latest[&ClientId::new("a")].seq, Some(2));
    }

    #[test]
    fn room_caps_tracked_clients() {
        let mut room = Room::new();
        for i in 0..MAX_CLIENTS_PER_ROOM {
            accept_snapshot(&mut room, &payload(&format!("c{i}"), None, 1)).unwrap();
        }
        assert!(matches!(
            accept_snapshot(&mut room, &payload("late", None, 1)),
            Err(RelayError::RoomFull)
        ));
        accept_snapshot(&mut room, &payload("c0", None, 4)).unwrap();
    }

    #[tokio::test]
    async fn broadcast_skips_sender_and_prunes_closed_peers() {
        let room = Arc::new(RwLock::new(Room::new()));
        let sender = Uuid::new_v4();
        let (sender_tx, mut sender_rx) = mpsc::unbounded_channel();
        let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
        let (gone_tx, gone_rx) = mpsc::unbounded_channel();
        drop(gone_rx);
        {
            let mut guard = room.write().await;
            guard.peers.insert(sender, sender_tx);
            guard.peers.insert(Uuid::new_v4(), peer_tx);
            guard.peers.insert(Uuid::new_v4(), gone_tx);
        }

        broadcast_except(&room, sender, Arc::from("hello")).await;

        assert_eq!(peer_rx.recv().await.as_deref(), Some("hello"));
        assert!(sender_rx.try_recv().is_err());
        assert_eq!(room.read().await.peers.len(), 2);
    }
}
