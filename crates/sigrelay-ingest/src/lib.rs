//! Chat ingestion for sigrelay.
//!
//! Pulls updates from the Telegram Bot API and stores accepted text events
//! as messages:
//! - `TelegramClient`: `getMe` / `getUpdates` over HTTPS
//! - `EventSource`: probe + long-poll seam (`TelegramPoller`, `MockEventSource`)
//! - `IngestionAdapter`: target-chat filtering, dispatch and store writes

pub mod adapter;
pub mod client;
pub mod error;
pub mod message;
pub mod source;

pub use adapter::{CaptureMode, IngestConfig, IngestOutcome, IngestionAdapter};
pub use client::{TelegramClient, DEFAULT_API_URL};
pub use error::{IngestError, IngestResult};
pub use message::{ApiResponse, BotUser, Chat, ChatEvent, ChatMessage, EventKind, Update, User};
pub use source::{DynEventSource, EventSource, MockEventSource, TelegramPoller};
