use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Chords::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Chords::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Chords::Name).string_len(64).not_null())
                    .col(ColumnDef::new(Chords::Fingering).string_len(32).not_null())
                    .col(ColumnDef::new(Chords::Description).text().null())
                    .col(
                        ColumnDef::new(Chords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chords_author")
                            .from(Chords::Table, Chords::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chords_author_name")
                    .table(Chords::Table)
                    .col(Chords::AuthorId)
                    .col(Chords::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Chords {
    Table,
    Id,
    AuthorId,
    Name,
    Fingering,
    Description,
    CreatedAt,
    UpdatedAt,
}
