use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use crate::advisor::Advisor;
use crate::error::{CoreError, CoreResult};
use crate::storage::HistoryStore;

pub mod analyze;
pub mod error;
pub mod openapi;

pub(crate) struct ServerState {
    pub(crate) advisor: Advisor,
    pub(crate) history: Arc<HistoryStore>,
}

pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Server {
    /// Bind and start serving in a background task. CORS is wide open: the
    /// caller is a browser extension on an arbitrary origin.
    pub async fn start(
        bind_addr: &str,
        advisor: Advisor,
        history: Arc<HistoryStore>,
    ) -> CoreResult<Self> {
        let state = Arc::new(ServerState { advisor, history });
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        let app = Router::new()
            .route("/", get(analyze::health))
            .route("/api/detect-product", post(analyze::detect_product))
            .route("/api/analyses/recent", get(analyze::recent_analyses))
            .with_state(state)
            .layer(cors);

        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|error| CoreError::Internal(format!("bind {bind_addr}: {error}")))?;
        let addr = listener
            .local_addr()
            .map_err(|error| CoreError::Internal(error.to_string()))?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        tracing::info!(%addr, "server started");
        Ok(Server {
            addr,
            shutdown: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(&mut self) -> CoreResult<()> {
        if let Some(sender) = self.shutdown.take() {
            sender
                .send(())
                .map_err(|_| CoreError::Internal("failed to send shutdown signal".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
