//! Chord entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use notepad_core::domain::{Chord, Fingering};
use notepad_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chords")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    /// Canonical fingering text, e.g. `X32010`.
    pub fingering: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Chord {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let fingering = Fingering::parse(&model.fingering)
            .map_err(|e| RepoError::Decode(format!("chord {}: {}", model.id, e)))?;

        Ok(Self {
            id: model.id,
            author_id: model.author_id,
            name: model.name,
            fingering,
            description: model.description,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<Chord> for ActiveModel {
    fn from(chord: Chord) -> Self {
        Self {
            id: Set(chord.id),
            author_id: Set(chord.author_id),
            name: Set(chord.name),
            fingering: Set(chord.fingering.to_string()),
            description: Set(chord.description),
            created_at: Set(chord.created_at.into()),
            updated_at: Set(chord.updated_at.into()),
        }
    }
}
