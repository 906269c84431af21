use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Chord, ChordChanges, ChordDiagram, Fingering, NewChord, User};
use crate::error::DomainError;
use crate::pagination::{Page, PageRequest};
use crate::ports::{ChordFilter, ChordRepository};

/// Chord browsing and authoring.
pub struct ChordService {
    chords: Arc<dyn ChordRepository>,
}

impl ChordService {
    pub fn new(chords: Arc<dyn ChordRepository>) -> Self {
        Self { chords }
    }

    pub async fn list(
        &self,
        filter: &ChordFilter,
        page: PageRequest,
    ) -> Result<Page<Chord>, DomainError> {
        Ok(self.chords.list(filter, page).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Chord, DomainError> {
        self.chords
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Chord",
                id,
            })
    }

    pub async fn create(&self, actor: &User, input: NewChord) -> Result<Chord, DomainError> {
        let chord = Chord::create(actor.id, input)?;
        self.ensure_name_free(&chord).await?;

        let chord = self.chords.insert(chord).await?;
        tracing::info!(chord_id = %chord.id, author_id = %actor.id, name = %chord.name, "Chord created");
        Ok(chord)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        changes: ChordChanges,
    ) -> Result<Chord, DomainError> {
        let mut chord = self.get(id).await?;
        ensure_can_edit(actor, &chord)?;

        let renamed = changes
            .name
            .as_deref()
            .is_some_and(|name| name.trim() != chord.name);
        chord.apply(changes)?;
        if renamed {
            self.ensure_name_free(&chord).await?;
        }

        let chord = self.chords.update(chord).await?;
        tracing::info!(chord_id = %chord.id, actor_id = %actor.id, "Chord updated");
        Ok(chord)
    }

    pub async fn delete(&self, actor: &User, id: Uuid) -> Result<(), DomainError> {
        let chord = self.get(id).await?;
        ensure_can_edit(actor, &chord)?;

        self.chords.delete(id).await?;
        tracing::info!(chord_id = %id, actor_id = %actor.id, "Chord deleted");
        Ok(())
    }

    pub async fn diagram(&self, id: Uuid) -> Result<(Chord, ChordDiagram), DomainError> {
        let chord = self.get(id).await?;
        let diagram = ChordDiagram::new(chord.fingering);
        Ok((chord, diagram))
    }

    /// Diagram for a fingering that has not been saved.
    pub fn preview(fingering: &str) -> Result<ChordDiagram, DomainError> {
        Ok(ChordDiagram::new(Fingering::parse(fingering)?))
    }

    async fn ensure_name_free(&self, chord: &Chord) -> Result<(), DomainError> {
        match self
            .chords
            .find_by_author_and_name(chord.author_id, &chord.name)
            .await?
        {
            Some(existing) if existing.id != chord.id => Err(DomainError::Duplicate(format!(
                "You already have a chord named '{}'",
                chord.name
            ))),
            _ => Ok(()),
        }
    }
}

fn ensure_can_edit(actor: &User, chord: &Chord) -> Result<(), DomainError> {
    if chord.author_id == actor.id || actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "Only the author or an administrator can change this chord".to_string(),
        ))
    }
}
