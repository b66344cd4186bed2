use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Milestone::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Milestone::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Milestone::ListenerId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Milestone::Nickname).string_len(64).not_null())
                    .col(ColumnDef::new(Milestone::Avatar).string().null())
                    .col(ColumnDef::new(Milestone::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Milestone::Threshold).big_integer().not_null())
                    .col(ColumnDef::new(Milestone::CreatedAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // 每个 (收听者, 类型, 阈值) 只允许一条记录
        manager
            .create_index(
                Index::create()
                    .name("uk_milestone_listener_kind_threshold")
                    .table(Milestone::Table)
                    .col(Milestone::ListenerId)
                    .col(Milestone::Kind)
                    .col(Milestone::Threshold)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_milestone_created_at")
                    .table(Milestone::Table)
                    .col(Milestone::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Milestone::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Milestone {
    Table,
    Id,
    ListenerId,
    Nickname,
    Avatar,
    Kind,
    Threshold,
    CreatedAt,
}
