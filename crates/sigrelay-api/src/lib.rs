//! sigrelay-api - REST API over stored messages and trade signals.
//!
//! # Routes
//!
//! ```text
//! GET  /               healthcheck
//! GET  /messages       paginated messages, newest first
//! GET  /messages/text  text of the newest 100 messages
//! POST /messages       create one message or a batch
//! GET  /trades         newest 100 trade signals
//! POST /trades         validate and create signals, per-item errors inline
//! GET  /metrics        Prometheus text exposition
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use sigrelay_api::{bind_with_retry, create_router, serve, ApiConfig, AppState};
//!
//! let listener = bind_with_retry(&config).await?;
//! let port = listener.local_addr()?.port();
//! let router = create_router(AppState::new(store, config).with_port(port));
//! serve(listener, router, shutdown_token).await?;
//! ```

mod config;
mod error;
mod handlers;
mod server;
mod state;
mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use server::{bind_with_retry, create_router, serve};
pub use state::AppState;
pub use types::{HealthResponse, MessagePage, MessageSubmission, PageParams, TradeBatchResponse};
