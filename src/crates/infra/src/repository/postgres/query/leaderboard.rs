use crate::repository::postgres::command::db_data::listener as db;
use async_trait::async_trait;
use model::leaderboard::{LeaderboardEntry, LeaderboardRepository};
use model::ModelError;
use sea_orm::*;

pub struct LeaderboardRepositoryImpl {
    db: DatabaseConnection,
}

impl LeaderboardRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeaderboardRepository for LeaderboardRepositoryImpl {
    async fn top_listeners(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, ModelError> {
        let rows = db::Entity::find()
            .filter(db::Column::TotalSeconds.gt(0))
            .order_by_desc(db::Column::TotalSeconds)
            .order_by_asc(db::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| ModelError::DbErr(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                listener_id: row.id,
                nickname: row.nickname,
                avatar: row.avatar,
                total_seconds: row.total_seconds,
                last_seen_at: row.last_seen_at,
            })
            .collect())
    }
}
