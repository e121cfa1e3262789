#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Wanich board game lending client.
//!
//! This crate hosts the data models, configuration handling, the catalog,
//! the record gateway boundary, and the session controller used by the
//! terminal UI and any future frontends.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod records;
pub mod selection;
pub mod session;

pub use catalog::{Catalog, GameDraft};
pub use config::AppConfig;
pub use error::{FormError, SessionError};
pub use gateway::{GatewayError, RecordGateway, SharedGateway};
pub use models::{BorrowRecord, Game, RecordKind, StudentInfo, User};
pub use records::RecordStore;
pub use selection::SelectionSet;
pub use session::{LendingSession, Screen, SubmissionOutcome};
