//! `vehicle-intake` - A web form that collects vehicle registration records
//!
//! This library provides form validation, the single-writer record store, the
//! document directory, the HTTP front end and the `.xlsx` export used by the
//! `vintake` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod export;
pub mod intake;
pub mod logging;
pub mod record;
pub mod server;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use documents::DocumentStore;
pub use error::{Error, IntakeError, ReportError, Result};
pub use intake::{IntakeService, Submission};
pub use logging::init_logging;
pub use record::{ExpiryDates, VehicleRecord};
pub use server::{create_router, serve, AppState};
pub use storage::{SharedStorage, Storage, StorageStats};
