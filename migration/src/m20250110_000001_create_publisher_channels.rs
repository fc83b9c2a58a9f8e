use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PublisherChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PublisherChannels::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PublisherChannels::PublisherId).uuid().not_null())
                    .col(ColumnDef::new(PublisherChannels::Platform).string().not_null())
                    .col(ColumnDef::new(PublisherChannels::ChannelUrl).string().not_null())
                    .col(
                        ColumnDef::new(PublisherChannels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_publisher_channels_publisher_platform")
                    .table(PublisherChannels::Table)
                    .col(PublisherChannels::PublisherId)
                    .col(PublisherChannels::Platform)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PublisherChannels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PublisherChannels {
    Table,
    Id,
    PublisherId,
    Platform,
    ChannelUrl,
    CreatedAt,
}
