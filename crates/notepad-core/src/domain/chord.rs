use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fingering::Fingering;
use crate::error::DomainError;

const MAX_NAME_CHARS: usize = 64;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Chord entity - a named fingering saved by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub fingering: Fingering,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new chord, still unvalidated.
#[derive(Debug, Clone)]
pub struct NewChord {
    pub name: String,
    pub fingering: String,
    pub description: Option<String>,
}

/// Partial update. `None` leaves the field untouched; an empty description
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct ChordChanges {
    pub name: Option<String>,
    pub fingering: Option<String>,
    pub description: Option<String>,
}

impl Chord {
    /// Validate input and create a chord owned by `author_id`.
    pub fn create(author_id: Uuid, input: NewChord) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            name: normalize_name(&input.name)?,
            fingering: Fingering::parse(&input.fingering)?,
            description: normalize_description(input.description)?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, changes: ChordChanges) -> Result<(), DomainError> {
        // Validate everything before touching self.
        let name = changes.name.as_deref().map(normalize_name).transpose()?;
        let fingering = changes
            .fingering
            .as_deref()
            .map(Fingering::parse)
            .transpose()?;
        let description = match changes.description {
            Some(text) => Some(normalize_description(Some(text))?),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(fingering) = fingering {
            self.fingering = fingering;
        }
        if let Some(description) = description {
            self.description = description;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("Chord name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::Validation(format!(
            "Chord name must be at most {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>, DomainError> {
    let Some(text) = description else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(DomainError::Validation(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(Some(text.to_string()))
}
