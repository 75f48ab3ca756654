use std::sync::Arc;

use axum::{Router, routing::get};

use crate::expenses;
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Builds the application router.
///
/// Endpoints are open: authentication/permission enforcement is an external
/// collaborator and is not applied here.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/expenses", get(expenses::index).post(expenses::create))
        .route(
            "/expenses/{id}",
            get(expenses::get_one)
                .put(expenses::update)
                .patch(expenses::patch)
                .delete(expenses::remove),
        )
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
