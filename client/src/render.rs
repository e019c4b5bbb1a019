use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use stratboard_shared::ClientId;

use crate::geometry::{PathCommand, SmoothedPath, MIN_RENDER_POINTS};
use crate::registry::ClientEntry;
use crate::state::Board;

pub const GLOW_FACTOR: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Grab,
    Grabbing,
}

impl Cursor {
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle<'a> {
    pub color: &'a str,
    pub width: f64,
    pub glow: f64,
}

pub trait Surface {
    fn resize(&mut self, width: f64, height: f64);
    fn clear(&mut self);
    fn set_transform(&mut self, scale: f64, x: f64, y: f64);
    fn draw_background(&mut self, x: f64, y: f64);
    fn stroke_path(&mut self, path: &[PathCommand], style: &StrokeStyle<'_>);
    fn set_cursor(&mut self, cursor: Cursor);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

#[derive(Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub skipped: usize,
    pub rebuilt: usize,
    pub extended: usize,
}

struct ClientPaths {
    revision: u64,
    paths: Vec<SmoothedPath>,
}

#[derive(Default)]
pub struct PathCache {
    clients: HashMap<ClientId, ClientPaths>,
}

impl PathCache {
    fn sync(&mut self, entry: &ClientEntry<'_>, stats: &mut FrameStats) -> &[SmoothedPath] {
        let cached = self
            .clients
            .entry(entry.id.clone())
            .or_insert_with(|| ClientPaths {
                revision: entry.revision,
                paths: Vec::new(),
            });
        // A new revision may rewrite any stroke; keep only paths whose
        // stroke still continues the points they were built from.
        let revised = cached.revision != entry.revision;
        cached.revision = entry.revision;
        let strokes = &entry.state.strokes;
        cached.paths.truncate(strokes.len());
        for (index, stroke) in strokes.iter().enumerate() {
            match cached.paths.get_mut(index) {
                Some(path) if revised && !path.continues_into(&stroke.points) => {
                    *path = SmoothedPath::build(&stroke.points);
                    stats.rebuilt += 1;
                }
                Some(path) if path.point_count() == stroke.len() => {}
                Some(path) => {
                    path.extend(&stroke.points);
                    stats.extended += 1;
                }
                None => {
                    cached.paths.push(SmoothedPath::build(&stroke.points));
                    stats.rebuilt += 1;
                }
            }
        }
        &cached.paths
    }

    pub fn len(&self) -> usize {
        self.clients.values().map(|client| client.paths.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct RenderLoop {
    cache: PathCache,
    stop: StopHandle,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    pub fn frame<S: Surface>(&mut self, board: &Board, surface: &mut S) -> LoopControl {
        if self.stop.is_stopped() {
            return LoopControl::Stop;
        }
        self.paint(board, surface);
        self.frames += 1;
        if self.stop.is_stopped() {
            LoopControl::Stop
        } else {
            LoopControl::Continue
        }
    }

    pub fn paint<S: Surface>(&mut self, board: &Board, surface: &mut S) -> FrameStats {
        let viewport = &board.viewport;
        surface.resize(viewport.width, viewport.height);
        surface.clear();
        surface.set_transform(viewport.scale, viewport.x, viewport.y);

        if board.background.is_loaded() {
            surface.draw_background(board.background.x, board.background.y);
        }

        let mut stats = FrameStats::default();
        for entry in board.registry.entries() {
            let width = f64::from(entry.state.width);
            let style = StrokeStyle {
                color: &entry.state.color,
                width,
                glow: width * GLOW_FACTOR,
            };
            let paths = self.cache.sync(&entry, &mut stats);
            for path in paths {
                if path.point_count() < MIN_RENDER_POINTS {
                    stats.skipped += 1;
                    continue;
                }
                surface.stroke_path(path.commands(), &style);
                stats.drawn += 1;
            }
        }

        surface.set_cursor(board.interaction.cursor());
        stats
    }
}
