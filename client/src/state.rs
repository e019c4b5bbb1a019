use stratboard_shared::{ClientId, ClientState};

use crate::background::BackgroundImage;
use crate::registry::ClientRegistry;
use crate::render::Cursor;
use crate::viewport::Viewport;

pub const MIN_WIDTH: u32 = 1;
pub const MAX_WIDTH: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    pub grab_locked: bool,
    pub grabbing: bool,
    pub last_pointer: (f64, f64),
}

impl Default for Interaction {
    fn default() -> Self {
        Self {
            grab_locked: true,
            grabbing: false,
            last_pointer: (0.0, 0.0),
        }
    }
}

impl Interaction {
    pub fn cursor(&self) -> Cursor {
        if self.grabbing {
            Cursor::Grabbing
        } else if self.grab_locked {
            Cursor::Default
        } else {
            Cursor::Grab
        }
    }
}

pub struct Board {
    pub registry: ClientRegistry,
    pub viewport: Viewport,
    pub background: BackgroundImage,
    pub interaction: Interaction,
}

impl Board {
    pub fn new(local_id: ClientId, width: f64, height: f64) -> Self {
        Self {
            registry: ClientRegistry::new(ClientState::new(local_id)),
            viewport: Viewport::new(width, height),
            background: BackgroundImage::default(),
            interaction: Interaction::default(),
        }
    }

    pub fn local_state(&self) -> &ClientState {
        self.registry.local().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_follows_interaction() {
        let mut interaction = Interaction::default();
        assert_eq!(interaction.cursor(), Cursor::Default);
        interaction.grab_locked = false;
        assert_eq!(interaction.cursor(), Cursor::Grab);
        interaction.grabbing = true;
        assert_eq!(interaction.cursor(), Cursor::Grabbing);
    }

    #[test]
    fn new_board_starts_with_identity_view() {
        let board = Board::new(ClientId::new("me"), 640.0, 480.0);
        assert_eq!(board.viewport.scale, 1.0);
        assert_eq!(board.local_state().id, ClientId::new("me"));
        assert!(!board.background.is_loaded());
    }
}
