use crate::repository::postgres::command::db_data::milestone as db;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use model::milestone_feed::{MilestoneFeedEntry, MilestoneFeedRepository};
use model::ModelError;
use sea_orm::*;

pub struct MilestoneFeedRepositoryImpl {
    db: DatabaseConnection,
}

impl MilestoneFeedRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MilestoneFeedRepository for MilestoneFeedRepositoryImpl {
    async fn list_milestones(
        &self,
        since: Option<NaiveDateTime>,
        limit: u64,
    ) -> Result<Vec<MilestoneFeedEntry>, ModelError> {
        let mut query = db::Entity::find();
        if let Some(since) = since {
            query = query.filter(db::Column::CreatedAt.gt(since));
        }
        let rows = query
            .order_by_desc(db::Column::CreatedAt)
            .order_by_desc(db::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| ModelError::DbErr(e.to_string()))?;
        Ok(rows.into_iter().map(MilestoneFeedEntry::from).collect())
    }
}
