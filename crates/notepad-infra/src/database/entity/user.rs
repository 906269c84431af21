//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use notepad_core::domain::{Role, User};
use notepad_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub blocked_until: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chord::Entity")]
    Chord,
}

impl Related<super::chord::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain User.
impl TryFrom<Model> for User {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role: Role = model
            .role
            .parse()
            .map_err(|_| RepoError::Decode(format!("user {} has role '{}'", model.id, model.role)))?;

        Ok(Self {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            role,
            blocked_until: model.blocked_until.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

/// Conversion from Domain User to SeaORM ActiveModel.
impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        Self {
            id: Set(user.id),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role.as_str().to_string()),
            blocked_until: Set(user.blocked_until.map(Into::into)),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
