use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContentFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentFiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContentFiles::ContentItemId).uuid().not_null())
                    .col(ColumnDef::new(ContentFiles::FileType).string().not_null())
                    .col(ColumnDef::new(ContentFiles::FilePath).string().not_null())
                    .col(ColumnDef::new(ContentFiles::Sha256).string().not_null())
                    .col(
                        ColumnDef::new(ContentFiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_files_content_item")
                            .from(ContentFiles::Table, ContentFiles::ContentItemId)
                            .to(ContentItems::Table, ContentItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_files_item")
                    .table(ContentFiles::Table)
                    .col(ContentFiles::ContentItemId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContentFiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ContentFiles {
    Table,
    Id,
    ContentItemId,
    FileType,
    FilePath,
    Sha256,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContentItems {
    Table,
    Id,
}
