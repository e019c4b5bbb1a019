use std::time::Duration;

use stratboard_shared::is_room_name;

use crate::sync::DEFAULT_SYNC_INTERVAL;

pub const DEFAULT_ROOM: &str = "lobby";
const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub room: String,
    pub sync_interval: Duration,
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            room: DEFAULT_ROOM.to_string(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            debug: false,
        }
    }
}

impl ClientConfig {
    pub fn from_query(search: &str) -> Self {
        let mut config = Self::default();
        let query = search.strip_prefix('?').unwrap_or(search);
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "room" => {
                    if is_room_name(value) {
                        config.room = value.to_string();
                    }
                }
                "sync_ms" => {
                    if let Ok(millis) = value.parse::<u64>() {
                        config.sync_interval = Duration::from_millis(millis).max(MIN_SYNC_INTERVAL);
                    }
                }
                "debug" => config.debug = matches!(value, "" | "1" | "true"),
                _ => {}
            }
        }
        config
    }
}
