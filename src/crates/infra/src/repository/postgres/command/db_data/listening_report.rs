use sea_orm::entity::prelude::*;

/// 已消费的上报令牌，每条已生效的上报一行
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listening_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub report_id: String,
    pub listener_id: String,
    #[sea_orm(column_type = "BigInteger")]
    pub seconds: i64,
    pub received_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
