use crate::config::FeedConfig;
use crate::query::QueryError;
use model::leaderboard::{LeaderboardEntry, LeaderboardRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct GetLeaderboard {
    repository: Arc<dyn LeaderboardRepository>,
    config: Arc<dyn FeedConfig>,
}

impl GetLeaderboard {
    pub fn new(repository: Arc<dyn LeaderboardRepository>, config: Arc<dyn FeedConfig>) -> Self {
        Self { repository, config }
    }

    pub async fn handle(&self, limit: Option<u64>) -> Result<Vec<LeaderboardEntry>, QueryError> {
        self.repository
            .top_listeners(self.config.clamp_limit(limit))
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))
    }
}
