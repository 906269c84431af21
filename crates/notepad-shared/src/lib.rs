//! # Notepad Shared
//!
//! Request and response types of the GuitarNotepad REST API.
//! Kept free of server dependencies so a Rust client (or WASM frontend) can reuse them.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, PagedResponse};
