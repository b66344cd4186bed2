use crate::config::FeedConfig;
use crate::query::QueryError;
use chrono::NaiveDateTime;
use model::milestone_feed::{MilestoneFeedEntry, MilestoneFeedRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct GetMilestones {
    repository: Arc<dyn MilestoneFeedRepository>,
    config: Arc<dyn FeedConfig>,
}

impl GetMilestones {
    pub fn new(repository: Arc<dyn MilestoneFeedRepository>, config: Arc<dyn FeedConfig>) -> Self {
        Self { repository, config }
    }

    /// 最新的里程碑在前
    pub async fn handle(
        &self,
        since: Option<NaiveDateTime>,
        limit: Option<u64>,
    ) -> Result<Vec<MilestoneFeedEntry>, QueryError> {
        let limit = self.config.clamp_limit(limit);
        self.repository
            .list_milestones(since, limit)
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))
    }
}
