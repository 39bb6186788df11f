//! Integration tests for sigrelay-bot.
//!
//! These tests drive the full application against the in-memory store and
//! a scripted chat source:
//! - Startup sequencing and failure paths
//! - Ingestion and HTTP serving while READY
//! - Ordered drain on shutdown

pub mod common;
