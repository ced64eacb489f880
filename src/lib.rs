//! # ecoslug
//!
//! A local pesticide application log. The [`store::RecordStore`] owns the
//! numbered log entries and writes them through a [`db::Medium`], a small
//! SQLite-backed key-value store. The weather, pest count, theme and sync
//! modules keep their own keys in the same medium.

pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod pest;
pub mod store;
pub mod sync;
pub mod theme;
pub mod weather;

pub use db::Medium;
pub use error::{EcoError, Result};
pub use models::{LogEntry, NewEntry};
pub use store::RecordStore;
