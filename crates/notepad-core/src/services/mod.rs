//! Application services - use cases on top of the domain and ports.
//!
//! Handlers resolve the acting account first (see [`AuthService::current_user`])
//! and pass it in, so every check here runs against live role and block state.

mod auth;
mod chords;
mod moderation;

pub use auth::{AuthService, AuthSession, Registration};
pub use chords::ChordService;
pub use moderation::ModerationService;

use crate::domain::User;
use crate::error::DomainError;

fn require_admin(actor: &User) -> Result<(), DomainError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "Administrator role required".to_string(),
        ))
    }
}

/// Mask an email for logging, `jane@example.com` becomes `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{}***", first),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        }
        None => "***".to_string(),
    }
}
