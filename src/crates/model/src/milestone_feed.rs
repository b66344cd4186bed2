use crate::ModelError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneFeedEntry {
    pub id: i64,
    pub listener_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub kind: String,
    pub threshold: i64,
    pub created_at: NaiveDateTime,
}

#[async_trait]
pub trait MilestoneFeedRepository: Send + Sync {
    /// 最新的在前；给出 `since` 时只返回其后创建的记录
    async fn list_milestones(
        &self,
        since: Option<NaiveDateTime>,
        limit: u64,
    ) -> Result<Vec<MilestoneFeedEntry>, ModelError>;
}
