//! sigrelay - Telegram-to-PostgreSQL relay with a REST API.
//!
//! Wires the components together:
//! - PostgreSQL record store
//! - Telegram long-poll ingestion
//! - Trade signal validation
//! - HTTP query service
//! - Lifecycle with ordered drain on shutdown

pub mod app;
pub mod config;
pub mod error;
pub mod lifecycle;

pub use app::{install_panic_hook, wait_for_signal, Application, ExitStatus, ShutdownHandle};
pub use config::{AppConfig, DatabaseConfig, ShutdownConfig, TelegramConfig};
pub use error::{AppError, AppResult};
pub use lifecycle::{Lifecycle, LifecycleState};
