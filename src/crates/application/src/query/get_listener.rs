use crate::query::QueryError;
use domain::listener::{Listener, ListenerRepository};
use domain::value::ListenerId;
use std::sync::Arc;

#[derive(Clone)]
pub struct GetListener {
    repository: Arc<dyn ListenerRepository>,
}

impl GetListener {
    pub fn new(repository: Arc<dyn ListenerRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, listener_id: &str) -> Result<Listener, QueryError> {
        let id: ListenerId = listener_id
            .parse()
            .map_err(|e: domain::value::ValueError| QueryError::InvalidInput(e.to_string()))?;
        self.repository
            .find_by_id(&id)
            .await
            .map_err(|e| QueryError::ExecutionError(e.to_string()))?
            .ok_or_else(|| QueryError::NotFound(format!("listener {}", id)))
    }
}
