//! # Notepad Core
//!
//! The domain and application layers of GuitarNotepad.
//! Entities, chord notation and the services that enforce permissions live
//! here; storage and crypto are reached only through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
pub use pagination::{Page, PageRequest};
