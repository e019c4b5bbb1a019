use std::collections::HashMap;
use std::sync::Arc;

use stratboard_shared::ClientId;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

pub const MAX_CLIENTS_PER_ROOM: usize = 256;

pub type PeerSender = mpsc::UnboundedSender<Arc<str>>;

#[derive(Clone, Default)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, Arc<RwLock<Room>>>>>,
}

#[derive(Clone, Debug)]
pub struct StoredSnapshot {
    pub seq: Option<u64>,
    pub payload: Arc<str>,
}

#[derive(Default)]
pub struct Room {
    pub peers: HashMap<Uuid, PeerSender>,
    pub latest: HashMap<ClientId, StoredSnapshot>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }
}
