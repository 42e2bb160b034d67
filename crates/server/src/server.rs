use axum::{Router, routing::post};

use std::sync::Arc;

use crate::{balance, funds, rates::RatesClient, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub rates: Arc<RatesClient>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/funds/add", post(funds::add))
        .route("/funds/withdraw", post(funds::withdraw))
        .route("/funds/transfer", post(funds::transfer))
        .route("/funds/get", post(balance::get))
        .route("/funds/details", post(transactions::list))
        .with_state(state)
}

pub async fn run(engine: Engine, rates: RatesClient) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:5000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, rates, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    rates: RatesClient,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        rates: Arc::new(rates),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    rates: RatesClient,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, rates, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
