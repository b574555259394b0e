use std::net::SocketAddr;

use axum::{
    Router,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    response::IntoResponse,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::FeedConfig;
use crate::connection;
use crate::dispatcher::Dispatcher;

/// Every path upgrades to the feed socket.
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .fallback(ws_upgrade)
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: &FeedConfig, dispatcher: Dispatcher) -> anyhow::Result<()> {
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Feed listener on {}", addr);
    serve_listener(listener, dispatcher).await
}

pub async fn serve_listener(listener: TcpListener, dispatcher: Dispatcher) -> anyhow::Result<()> {
    axum::serve(
        listener,
        router(dispatcher).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn ws_upgrade(
    State(dispatcher): State<Dispatcher>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, peer))
}
