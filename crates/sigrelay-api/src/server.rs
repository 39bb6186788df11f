//! HTTP server implementation using axum.

use std::io::ErrorKind;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::state::AppState;

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route(
            "/messages",
            get(handlers::list_messages).post(handlers::create_messages),
        )
        .route("/messages/text", get(handlers::list_message_texts))
        .route(
            "/trades",
            get(handlers::list_trades).post(handlers::create_trades),
        )
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener, moving to the next port while the address is in use.
///
/// At most `max_port_attempts` ports are tried. Permission errors are not
/// retried.
pub async fn bind_with_retry(config: &ApiConfig) -> ApiResult<TcpListener> {
    let attempts = config.max_port_attempts.max(1);
    let mut port = config.port;

    for attempt in 1..=attempts {
        let address = format!("{}:{}", config.bind_address, port);
        match TcpListener::bind(&address).await {
            Ok(listener) => {
                let bound = listener.local_addr()?;
                info!(%bound, attempt, "HTTP listener bound");
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse && port != 0 && attempt < attempts => {
                warn!(port, attempt, max_attempts = attempts, "Port already in use, trying next");
                port = port.checked_add(1).ok_or_else(|| ApiError::Bind {
                    address: address.clone(),
                    reason: "no ports left".to_string(),
                })?;
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                error!(port, "Port requires elevated privileges");
                return Err(ApiError::Bind {
                    address,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                error!(port, error = %e, "Failed to bind HTTP listener");
                return Err(ApiError::Bind {
                    address,
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(ApiError::Bind {
        address: format!("{}:{}", config.bind_address, config.port),
        reason: format!("no free port after {attempts} attempts"),
    })
}

/// Serve until `shutdown` is cancelled, then stop accepting connections
/// and let in-flight requests finish.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> ApiResult<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("HTTP server closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_moves_past_busy_port() {
        let busy = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let busy_port = busy.local_addr().unwrap().port();

        let config = ApiConfig {
            bind_address: "127.0.0.1".to_string(),
            port: busy_port,
            max_port_attempts: 5,
            ..ApiConfig::default()
        };
        let listener = bind_with_retry(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), busy_port);
    }

    #[tokio::test]
    async fn test_bind_gives_up_after_attempts() {
        let busy = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ApiConfig {
            bind_address: "127.0.0.1".to_string(),
            port: busy.local_addr().unwrap().port(),
            max_port_attempts: 1,
            ..ApiConfig::default()
        };
        assert!(matches!(
            bind_with_retry(&config).await,
            Err(ApiError::Bind { .. })
        ));
    }
}
