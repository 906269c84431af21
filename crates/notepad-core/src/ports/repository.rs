use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Chord, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Store a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Filter for the user listing in the moderation panel.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of username or email.
    pub search: Option<String>,
}

/// Filter for chord listings.
#[derive(Debug, Clone, Default)]
pub struct ChordFilter {
    /// Case-insensitive substring of the chord name.
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Users ordered by username.
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, RepoError>;

    /// Clear block stamps that lapsed at or before `now`. Returns the number of users touched.
    async fn clear_expired_blocks(&self, now: DateTime<Utc>) -> Result<u64, RepoError>;
}

/// Chord repository.
#[async_trait]
pub trait ChordRepository: BaseRepository<Chord, Uuid> {
    async fn find_by_author_and_name(
        &self,
        author_id: Uuid,
        name: &str,
    ) -> Result<Option<Chord>, RepoError>;

    /// Chords ordered by name.
    async fn list(&self, filter: &ChordFilter, page: PageRequest)
    -> Result<Page<Chord>, RepoError>;
}
