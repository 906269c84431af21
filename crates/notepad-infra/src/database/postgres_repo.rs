//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use notepad_core::domain::{Chord, User};
use notepad_core::error::RepoError;
use notepad_core::pagination::{Page, PageRequest};
use notepad_core::ports::{ChordFilter, ChordRepository, UserFilter, UserRepository};
use notepad_core::services::mask_email;

use super::entity::chord::{self, Entity as ChordEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL chord repository.
pub type PostgresChordRepository = PostgresBaseRepository<ChordEntity>;

/// `%needle%` for a case-insensitive LIKE against `lower(column)`.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// `lower(column)`, the sort key shared with the in-memory store.
fn lower(column: impl sea_orm::sea_query::IntoColumnRef) -> SimpleExpr {
    Func::lower(Expr::col(column)).into()
}

fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn decode_all<M, T>(models: Vec<M>) -> Result<Vec<T>, RepoError>
where
    T: TryFrom<M, Error = RepoError>,
{
    models.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(query_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(query_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, RepoError> {
        let mut query = UserEntity::find()
            .order_by_asc(lower(user::Column::Username))
            .order_by_asc(user::Column::Username);

        if let Some(search) = search_term(&filter.search) {
            let pattern = like_pattern(search);
            query = query.filter(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::Username))).like(&pattern))
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::Email))).like(&pattern)),
            );
        }

        let paginator = query.paginate(&*self.db, page.page_size);
        let total_items = paginator.num_items().await.map_err(query_error)?;
        let models = paginator
            .fetch_page(page.index())
            .await
            .map_err(query_error)?;

        Ok(Page::new(decode_all(models)?, page, total_items))
    }

    async fn clear_expired_blocks(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let now: DateTimeWithTimeZone = now.into();
        let result = UserEntity::update_many()
            .col_expr(
                user::Column::BlockedUntil,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::BlockedUntil.lte(now))
            .exec(&*self.db)
            .await
            .map_err(write_error)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl ChordRepository for PostgresChordRepository {
    async fn find_by_author_and_name(
        &self,
        author_id: Uuid,
        name: &str,
    ) -> Result<Option<Chord>, RepoError> {
        ChordEntity::find()
            .filter(chord::Column::AuthorId.eq(author_id))
            .filter(chord::Column::Name.eq(name))
            .one(&*self.db)
            .await
            .map_err(query_error)?
            .map(Chord::try_from)
            .transpose()
    }

    async fn list(
        &self,
        filter: &ChordFilter,
        page: PageRequest,
    ) -> Result<Page<Chord>, RepoError> {
        let mut query = ChordEntity::find()
            .order_by_asc(lower(chord::Column::Name))
            .order_by_asc(chord::Column::Name)
            .order_by_asc(chord::Column::CreatedAt);

        if let Some(author_id) = filter.author_id {
            query = query.filter(chord::Column::AuthorId.eq(author_id));
        }
        if let Some(search) = search_term(&filter.search) {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(chord::Column::Name))).like(like_pattern(search)),
            );
        }

        let paginator = query.paginate(&*self.db, page.page_size);
        let total_items = paginator.num_items().await.map_err(query_error)?;
        let models = paginator
            .fetch_page(page.index())
            .await
            .map_err(query_error)?;

        Ok(Page::new(decode_all(models)?, page, total_items))
    }
}
