use stratboard_shared::is_room_name;

pub fn room_from_path(path: &str) -> Option<String> {
    let mut parts = path.trim_matches('/').split('/');
    if parts.next()? != "r" {
        return None;
    }
    let room = parts.next()?;
    if is_room_name(room) {
        Some(room.to_string())
    } else {
        None
    }
}

pub fn websocket_url(protocol: &str, host: &str, room: &str) -> String {
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    format!("{scheme}://{host}/ws/{room}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_pages_use_wss() {
        assert_eq!(
            websocket_url("https:", "board.example", "abc"),
            "wss://board.example/ws/abc"
        );
        assert_eq!(
            websocket_url("http:", "localhost:3000", "lobby"),
            "ws://localhost:3000/ws/lobby"
        );
    }

    #[test]
    fn room_is_read_from_path() {
        assert_eq!(room_from_path("/r/abc-123"), Some("abc-123".to_string()));
        assert_eq!(room_from_path("/r/abc-123/"), Some("abc-123".to_string()));
        assert_eq!(room_from_path("/"), None);
        assert_eq!(room_from_path("/s/abc"), None);
        assert_eq!(room_from_path("/r/"), None);
        assert_eq!(room_from_path("/r/a%20b"), None);
    }
}
