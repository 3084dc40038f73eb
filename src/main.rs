use log::{error, info};

use campus_service::integration::Config;
use campus_service::state::AppState;

#[tokio::main]
async fn main() {
    let cfg = Config::default();
    let state = AppState::init(&cfg);

    let app = campus_service::app(state).layer(cfg.env.cors());

    let addr = cfg.env.addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => panic!("Failed to bind {addr}: {e}"),
    };

    info!("Starting server on {addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {e}");
    }
}
