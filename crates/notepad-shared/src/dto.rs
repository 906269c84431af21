//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request to login. `login` is either the username or the email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Response containing the access token and the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub blocked_until: Option<DateTime<Utc>>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to block a user. Exactly one of `until` or `duration_hours` must be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockUserRequest {
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_hours: Option<i64>,
}

// ---------------------------------------------------------------------------
// Chords
// ---------------------------------------------------------------------------

/// Request to create a chord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChordRequest {
    pub name: String,
    pub fingering: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a chord. Absent fields are left untouched; an empty
/// description clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChordRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fingering: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    /// Canonical fingering, e.g. `X32010` or `8-10-10-9-8-8`.
    pub fingering: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fretted finger position, strings numbered 0 (low E) to 5 (high e).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotResponse {
    pub string: usize,
    pub fret: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarreResponse {
    pub fret: u8,
    pub first_string: usize,
    pub last_string: usize,
}

/// Geometry of a chord diagram, enough for a client to draw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramResponse {
    pub fingering: String,
    pub base_fret: u8,
    pub fret_count: u8,
    pub muted: Vec<usize>,
    pub open: Vec<usize>,
    pub dots: Vec<DotResponse>,
    pub barre: Option<BarreResponse>,
}

/// Diagram of a stored chord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordDiagramResponse {
    pub chord: ChordResponse,
    pub diagram: DiagramResponse,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Common list query string: `?page=&page_size=&search=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

/// Chord list query string; adds an author filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChordListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewQuery {
    pub fingering: String,
}
