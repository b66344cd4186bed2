use domain::listener::{Listener, ListenerError};
use domain::value::ListenerId;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listener")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub nickname: String,
    #[sea_orm(nullable)]
    pub avatar: Option<String>,
    /// 累计收听秒数
    #[sea_orm(column_type = "BigInteger")]
    pub total_seconds: i64,
    pub last_seen_at: DateTime,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Listener {
    type Error = ListenerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id: ListenerId = model
            .id
            .parse()
            .map_err(|e: domain::value::ValueError| ListenerError::DbErr(e.to_string()))?;
        Ok(Listener {
            id,
            nickname: model.nickname,
            avatar: model.avatar,
            total_seconds: model.total_seconds,
            last_seen_at: model.last_seen_at,
            created_at: model.created_at,
        })
    }
}
