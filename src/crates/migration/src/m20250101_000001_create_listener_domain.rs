use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Listener::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Listener::Id)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Listener::Nickname).string_len(64).not_null())
                    .col(ColumnDef::new(Listener::Avatar).string().null())
                    .col(
                        ColumnDef::new(Listener::TotalSeconds)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Listener::LastSeenAt).date_time().not_null())
                    .col(ColumnDef::new(Listener::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // 排行榜按累计时长倒序
        manager
            .create_index(
                Index::create()
                    .name("idx_listener_total_seconds")
                    .table(Listener::Table)
                    .col(Listener::TotalSeconds)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ListeningReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListeningReport::ReportId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ListeningReport::ListenerId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListeningReport::Seconds)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListeningReport::ReceivedAt)
                            .date_time()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listening_report_listener_id")
                    .table(ListeningReport::Table)
                    .col(ListeningReport::ListenerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListeningReport::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Listener::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Listener {
    Table,
    Id,
    Nickname,
    Avatar,
    TotalSeconds,
    LastSeenAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ListeningReport {
    Table,
    ReportId,
    ListenerId,
    Seconds,
    ReceivedAt,
}
