use domain::milestone::Milestone;
use model::milestone_feed::MilestoneFeedEntry;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "milestone")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[sea_orm(column_type = "BigInteger")]
    pub id: i64,
    pub listener_id: String,
    /// 达到阈值时的昵称快照
    pub nickname: String,
    #[sea_orm(nullable)]
    pub avatar: Option<String>,
    pub kind: String,
    #[sea_orm(column_type = "BigInteger")]
    pub threshold: i64,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Milestone> for ActiveModel {
    fn from(milestone: &Milestone) -> Self {
        Self {
            id: Set(milestone.id.as_i64()),
            listener_id: Set(milestone.listener_id.to_string()),
            nickname: Set(milestone.nickname.clone()),
            avatar: Set(milestone.avatar.clone()),
            kind: Set(milestone.kind.name().to_string()),
            threshold: Set(milestone.threshold),
            created_at: Set(milestone.created_at),
        }
    }
}

impl From<Model> for MilestoneFeedEntry {
    fn from(model: Model) -> Self {
        MilestoneFeedEntry {
            id: model.id,
            listener_id: model.listener_id,
            nickname: model.nickname,
            avatar: model.avatar,
            kind: model.kind,
            threshold: model.threshold,
            created_at: model.created_at,
        }
    }
}
