//! Integration tests for sigrelay-ingest.
//!
//! These tests exercise the Bot API client and poller against a local
//! HTTP server standing in for Telegram.

pub mod common;
