pub mod actions;
pub mod background;
pub mod config;
pub mod geometry;
pub mod net;
pub mod registry;
pub mod render;
pub mod state;
pub mod strokes;
pub mod sync;
pub mod viewport;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod util;
#[cfg(target_arch = "wasm32")]
mod ws;

pub use registry::{ClientRegistry, UpsertOutcome};
pub use render::{RenderLoop, Surface};
pub use state::Board;
pub use sync::{SyncChannel, Transport};
pub use viewport::Viewport;

#[cfg(target_arch = "wasm32")]
pub use app::run;
