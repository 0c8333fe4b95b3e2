#![forbid(unsafe_code)]

//! Core domain model and business logic for the vaccine scheduler.
//!
//! This crate provides:
//! - Domain types (roles, vaccines, slots, appointments)
//! - Password policy and credential hashing
//! - SQLite-backed ledgers behind storage traits
//! - The session state machine and reservation engine
//! - Configuration, logging and appointment export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod input;
pub mod password;
pub mod ledger;
pub mod sqlite;
pub mod session;
pub mod engine;
pub mod scheduler;
pub mod export;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use session::Session;
pub use sqlite::Database;
pub use scheduler::Scheduler;
pub use export::{export_appointments, export_appointments_to_path, ExportFormat};
