use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use stratboard_server::{router, AppState};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding index.html and the compiled client bundle.
    #[arg(long)]
    public_dir: Option<PathBuf>,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));
    let app = router(AppState::default(), &public_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%addr, %error, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(port = args.port, public_dir = %public_dir.display(), "stratboard relay listening");
    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(%error, "server stopped");
        std::process::exit(1);
    }
}
