use stratboard_shared::{DEFAULT_COLOR, MAX_COLOR_LEN};

use crate::background::ImageSource;
use crate::state::{Board, MAX_WIDTH, MIN_WIDTH};

pub fn sanitize_color(color: &str) -> String {
    let color = color.trim();
    if color.is_empty() {
        return DEFAULT_COLOR.to_string();
    }
    let mut end = color.len().min(MAX_COLOR_LEN);
    while !color.is_char_boundary(end) {
        end -= 1;
    }
    color[..end].to_string()
}

pub fn sanitize_width(width: u32) -> u32 {
    width.clamp(MIN_WIDTH, MAX_WIDTH)
}

pub fn pointer_down(board: &mut Board, screen_x: f64, screen_y: f64) {
    if board.interaction.grab_locked {
        board.registry.get_local().begin_stroke();
    } else {
        board.interaction.grabbing = true;
    }
    board.interaction.last_pointer = (screen_x, screen_y);
}

pub fn pointer_move(board: &mut Board, screen_x: f64, screen_y: f64) {
    let (last_x, last_y) = board.interaction.last_pointer;
    if board.interaction.grabbing {
        board.viewport.pan(screen_x - last_x, screen_y - last_y);
    } else if board.registry.local().is_drawing() {
        let point = board.viewport.screen_to_world(screen_x, screen_y);
        board.registry.get_local().append_point(point.x, point.y);
    }
    board.interaction.last_pointer = (screen_x, screen_y);
}

pub fn pointer_up(board: &mut Board) {
    board.interaction.grabbing = false;
    board.registry.get_local().end_stroke();
}

pub fn wheel(board: &mut Board, direction: f64, screen_x: f64, screen_y: f64) {
    board.viewport.wheel(direction, screen_x, screen_y);
}

pub fn set_pan_modifier(board: &mut Board, held: bool) {
    board.interaction.grab_locked = !held;
}

pub fn resize(board: &mut Board, width: f64, height: f64) {
    board.viewport.resize(width, height);
}

pub fn set_width(board: &mut Board, width: u32) {
    board.registry.get_local().set_width(sanitize_width(width));
}

pub fn set_color(board: &mut Board, color: &str) {
    board.registry.get_local().set_color(sanitize_color(color));
}

pub fn reset(board: &mut Board) {
    board.registry.get_local().reset();
    board.viewport.reset();
}

pub fn paste_text(board: &mut Board, text: &str) -> Option<ImageSource> {
    let Some(source) = ImageSource::from_pasted_text(text) else {
        tracing::debug!("ignoring pasted text that is not an absolute url");
        return None;
    };
    board.background.set_source(source.clone());
    Some(source)
}

pub fn drop_file(board: &mut Board, mime: &str, bytes: &[u8]) -> ImageSource {
    let source = ImageSource::from_file(mime, bytes);
    tracing::debug!(mime, bytes = bytes.len(), "background file dropped");
    board.background.set_source(source.clone());
    source
}

pub fn image_loaded(board: &mut Board, source: &ImageSource, width: f64, height: f64) -> bool {
    if !board
        .background
        .on_loaded(source, width, height, &board.viewport)
    {
        tracing::debug!("ignoring load of a replaced background");
        return false;
    }
    tracing::info!(
        width,
        height,
        x = board.background.x,
        y = board.background.y,
        "background image loaded"
    );
    true
}

pub fn image_failed(board: &mut Board, source: &ImageSource) {
    if board.background.on_failed(source) {
        tracing::warn!(
            keeping_previous = board.background.is_loaded(),
            "background image failed to load"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratboard_shared::{ClientId, Point};

    fn board() -> Board {
        Board::new(ClientId::new("me"), 800.0, 600.0)
    }

    #[test]
    fn drawing_records_world_points() {
        let mut board = board();
        board.viewport.scale = 2.0;
        board.viewport.x = 5.0;
        pointer_down(&mut board, 10.0, 10.0);
        pointer_move(&mut board, 20.0, 40.0);
        pointer_move(&mut board, 30.0, 40.0);
        pointer_up(&mut board);
        pointer_move(&mut board, 50.0, 50.0);

        let strokes = board.registry.local().strokes();
        assert_eq!(strokes.len(), 1);
        assert_eq!(
            strokes[0].points,
            vec![Point::new(5.0, 20.0), Point::new(10.0, 20.0)]
        );
    }

    #[test]
    fn modifier_switches_to_panning() {
        let mut board = board();
        set_pan_modifier(&mut board, true);
        pointer_down(&mut board, 100.0, 100.0);
        pointer_move(&mut board, 130.0, 90.0);
        assert_eq!((board.viewport.x, board.viewport.y), (30.0, -10.0));
        assert!(board.registry.local().strokes().is_empty());

        pointer_up(&mut board);
        set_pan_modifier(&mut board, false);
        assert!(board.interaction.grab_locked);
        assert!(!board.interaction.grabbing);
    }

    #[test]
    fn reset_clears_strokes_and_view() {
        let mut board = board();
        pointer_down(&mut board, 10.0, 10.0);
        for x in [10.0, 20.0, 30.0] {
            pointer_move(&mut board, x, 10.0);
        }
        wheel(&mut board, 1.0, 50.0, 50.0);
        reset(&mut board);
        assert!(board.registry.local().strokes().is_empty());
        assert_eq!(board.viewport.scale, 1.0);
        assert_eq!((board.viewport.x, board.viewport.y), (0.0, 0.0));
    }

    #[test]
    fn controls_are_sanitized() {
        let mut board = board();
        set_width(&mut board, 0);
        assert_eq!(board.local_state().width, 1);
        set_width(&mut board, 9);
        assert_eq!(board.local_state().width, 4);
        set_color(&mut board, "  ");
        assert_eq!(board.local_state().color, DEFAULT_COLOR);
        set_color(&mut board, "#12ab34");
        assert_eq!(board.local_state().color, "#12ab34");
        assert_eq!(sanitize_color(&"é".repeat(40)).len(), MAX_COLOR_LEN);
        assert_eq!(sanitize_color(&format!("a{}", "é".repeat(40))).len(), MAX_COLOR_LEN - 1);
    }

    #[test]
    fn invalid_paste_keeps_current_background() {
        let mut board = board();
        let source = paste_text(&mut board, "https://example.com/map.png").unwrap();
        assert!(paste_text(&mut board, "not a url").is_none());
        assert_eq!(board.background.pending(), Some(&source));
        assert!(image_loaded(&mut board, &source, 400.0, 200.0));
        assert_eq!(
            board.background.source().map(ImageSource::as_str),
            Some("https://example.com/map.png")
        );
        assert_eq!((board.background.x, board.background.y), (200.0, 200.0));
    }

    #[test]
    fn failed_drop_keeps_loaded_background() {
        let mut board = board();
        let pasted = paste_text(&mut board, "https://example.com/map.png").unwrap();
        image_loaded(&mut board, &pasted, 400.0, 200.0);

        let dropped = drop_file(&mut board, "image/png", b"not really a png");
        image_failed(&mut board, &dropped);
        assert_eq!(board.background.source(), Some(&pasted));
        assert!(board.background.pending().is_none());
    }
}
