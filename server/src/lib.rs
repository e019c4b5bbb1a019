use std::path::Path;

use axum::routing::get;
use axum::{Extension, Router};
use tower_http::services::ServeDir;

pub mod handlers;
pub mod relay;
pub mod rooms;
pub mod state;

use crate::handlers::{room_handler, root_handler, ws_handler, IndexFile};
pub use crate::state::AppState;

pub fn router(state: AppState, public_dir: &Path) -> Router {
    let index_file = IndexFile(public_dir.join("index.html"));
    Router::new()
        .route("/", get(root_handler))
        .route("/r/:room_id", get(room_handler))
        .route("/ws/:room_id", get(ws_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(Extension(index_file))
        .with_state(state)
}
