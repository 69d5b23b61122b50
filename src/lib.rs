//! OpenProvider registrar adapter.
//!
//! Implements the [`registrar::Registrar`] operations (availability checks,
//! registration, transfer, renewal, deletion, locking, nameserver, contact
//! and privacy updates) on top of the OpenProvider REST API.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod registrar;
pub mod secrets;

pub use error::{RegistrarError, Result};
