//! Recall Storage crate - durable key-value persistence for chat memory.
//!
//! Provides the [`KeyValueStore`] abstraction the conversation engine
//! persists through, an in-memory implementation for tests and ephemeral
//! sessions, and a WAL-mode SQLite implementation with migrations.

pub mod db;
pub mod kv;
pub mod migrations;

pub use db::SqliteStore;
pub use kv::{InMemoryStore, KeyValueStore};
