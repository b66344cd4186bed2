use crate::ModelError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub listener_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub total_seconds: i64,
    pub last_seen_at: NaiveDateTime,
}

#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// 累计时长倒序，相同时按收听者 ID 排序
    async fn top_listeners(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, ModelError>;
}
