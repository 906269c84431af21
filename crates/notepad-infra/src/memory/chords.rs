use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use notepad_core::domain::Chord;
use notepad_core::error::RepoError;
use notepad_core::pagination::{Page, PageRequest};
use notepad_core::ports::{BaseRepository, ChordFilter, ChordRepository};

use super::{matches_search, paginate};

/// Chord store backed by a `HashMap` behind an async `RwLock`.
#[derive(Default)]
pub struct InMemoryChordRepository {
    store: RwLock<HashMap<Uuid, Chord>>,
}

impl InMemoryChordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_taken(store: &HashMap<Uuid, Chord>, chord: &Chord) -> bool {
        store
            .values()
            .any(|c| c.id != chord.id && c.author_id == chord.author_id && c.name == chord.name)
    }
}

#[async_trait]
impl BaseRepository<Chord, Uuid> for InMemoryChordRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Chord>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, chord: Chord) -> Result<Chord, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&chord.id) || Self::name_taken(&store, &chord) {
            return Err(RepoError::Constraint("Chord already exists".to_string()));
        }
        store.insert(chord.id, chord.clone());
        Ok(chord)
    }

    async fn update(&self, chord: Chord) -> Result<Chord, RepoError> {
        let mut store = self.store.write().await;
        if !store.contains_key(&chord.id) {
            return Err(RepoError::NotFound);
        }
        if Self::name_taken(&store, &chord) {
            return Err(RepoError::Constraint("Chord name already used".to_string()));
        }
        store.insert(chord.id, chord.clone());
        Ok(chord)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl ChordRepository for InMemoryChordRepository {
    async fn find_by_author_and_name(
        &self,
        author_id: Uuid,
        name: &str,
    ) -> Result<Option<Chord>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|c| c.author_id == author_id && c.name == name)
            .cloned())
    }

    async fn list(
        &self,
        filter: &ChordFilter,
        page: PageRequest,
    ) -> Result<Page<Chord>, RepoError> {
        let store = self.store.read().await;
        let mut chords: Vec<Chord> = store
            .values()
            .filter(|c| filter.author_id.is_none_or(|author| c.author_id == author))
            .filter(|c| matches_search(&c.name, &filter.search))
            .cloned()
            .collect();
        chords.sort_by_cached_key(|c| (c.name.to_lowercase(), c.name.clone(), c.created_at));

        Ok(paginate(&chords, page))
    }
}
