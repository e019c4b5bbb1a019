use std::sync::Arc;

use stratboard_shared::is_room_name;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::relay::replay;
use crate::state::{AppState, PeerSender, Room};

pub fn new_room_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn normalize_room_id(value: &str) -> Option<String> {
    if is_room_name(value) {
        Some(value.to_ascii_lowercase())
    } else {
        None
    }
}

pub struct Joined {
    pub room: Arc<RwLock<Room>>,
    pub replayed: usize,
    pub peers: usize,
}

/// Registers a peer and queues the room's replay on its sender. Lookup and
/// registration happen under the room map lock, so a concurrent
/// [`leave_room`] can never drop the room in between.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    connection_id: Uuid,
    tx: PeerSender,
) -> Joined {
    let mut rooms = state.rooms.write().await;
    let room = rooms
        .entry(room_id.to_string())
        .or_insert_with(|| {
            tracing::info!(room = room_id, "room created");
            Arc::new(RwLock::new(Room::new()))
        })
        .clone();

    let mut guard = room.write().await;
    let backlog = replay(&guard);
    let replayed = backlog.len();
    for payload in backlog {
        let _ = tx.send(payload);
    }
    guard.peers.insert(connection_id, tx);
    let peers = guard.peers.len();
    drop(guard);

    Joined {
        room,
        replayed,
        peers,
    }
}

pub async fn leave_room(
    state: &AppState,
    room_id: &str,
    room: &Arc<RwLock<Room>>,
    connection_id: Uuid,
) -> usize {
    let remaining = {
        let mut room = room.write().await;
        room.peers.remove(&connection_id);
        room.peers.len()
    };
    if remaining > 0 {
        return remaining;
    }
    let mut rooms = state.rooms.write().await;
    if let Some(current) = rooms.get(room_id) {
        if Arc::ptr_eq(current, room) && current.read().await.peers.is_empty() {
            rooms.remove(room_id);
            tracing::info!(room = room_id, "room closed");
        }
    }
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn room_ids_are_normalized() {
        assert_eq!(normalize_room_id("Lobby"), Some("lobby".to_string()));
        assert_eq!(normalize_room_id("../etc"), None);
        assert_eq!(normalize_room_id(""), None);
        let fresh = new_room_id();
        assert_eq!(normalize_room_id(&fresh), Some(fresh));
    }

    #[tokio::test]
    async fn rooms_are_shared_and_removed_when_empty() {
        let state = AppState::default();
        let (first_tx, _first_rx) = mpsc::unbounded_channel();
        let (second_tx, _second_rx) = mpsc::unbounded_channel();
        let (first_id, second_id) = (Uuid::new_v4(), Uuid::new_v4());
        let first = join_room(&state, "a", first_id, first_tx).await;
        let second = join_room(&state, "a", second_id, second_tx).await;
        assert!(Arc::ptr_eq(&first.room, &second.room));
        assert_eq!(second.peers, 2);

        assert_eq!(leave_room(&state, "a", &first.room, first_id).await, 1);
        assert!(state.rooms.read().await.contains_key("a"));

        assert_eq!(leave_room(&state, "a", &second.room, second_id).await, 0);
        assert!(!state.rooms.read().await.contains_key("a"));
    }

    #[tokio::test]
    async fn joiner_after_last_leave_shares_the_next_room() {
        let state = AppState::default();
        let (y_tx, _y_rx) = mpsc::unbounded_channel();
        let y_id = Uuid::new_v4();
        let y = join_room(&state, "a", y_id, y_tx).await;
        leave_room(&state, "a", &y.room, y_id).await;

        let (x_tx, _x_rx) = mpsc::unbounded_channel();
        let (z_tx, _z_rx) = mpsc::unbounded_channel();
        let x = join_room(&state, "a", Uuid::new_v4(), x_tx).await;
        let z = join_room(&state, "a", Uuid::new_v4(), z_tx).await;
        assert!(!Arc::ptr_eq(&x.room, &y.room));
        assert!(Arc::ptr_eq(&x.room, &z.room));
        assert_eq!(z.peers, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_leave_never_orphans_a_joiner() {
        let state = AppState::default();
        for _ in 0..200 {
            let leaver_id = Uuid::new_v4();
            let (leaver_tx, _leaver_rx) = mpsc::unbounded_channel();
            let leaver = join_room(&state, "busy", leaver_id, leaver_tx).await.room;
            let leave = {
                let state = state.clone();
                tokio::spawn(async move {
                    leave_room(&state, "busy", &leaver, leaver_id).await;
                })
            };

            let joiner_id = Uuid::new_v4();
            let (joiner_tx, _joiner_rx) = mpsc::unbounded_channel();
            let joined = join_room(&state, "busy", joiner_id, joiner_tx).await.room;
            leave.await.unwrap();

            let current = state.rooms.read().await.get("busy").cloned().unwrap();
            assert!(Arc::ptr_eq(&current, &joined));
            assert!(current.read().await.peers.contains_key(&joiner_id));
            leave_room(&state, "busy", &joined, joiner_id).await;
        }
    }

    #[tokio::test]
    async fn joiner_receives_replay_before_live_traffic() {
        let state = AppState::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let first = join_room(&state, "r", Uuid::new_v4(), tx).await;
        first.room.write().await.latest.insert(
            stratboard_shared::ClientId::new("a"),
            crate::state::StoredSnapshot {
                seq: Some(3),
                payload: Arc::from("stored"),
            },
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let second = join_room(&state, "r", Uuid::new_v4(), tx).await;
        assert_eq!(second.replayed, 1);
        assert_eq!(rx.recv().await.as_deref(), Some("stored"));
    }
}
