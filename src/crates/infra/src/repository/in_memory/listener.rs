use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domain::listener::{Accrual, AccrualOutcome, Listener, ListenerError, ListenerRepository};
use domain::value::{ListenerId, ReportId};
use model::leaderboard::{LeaderboardEntry, LeaderboardRepository};
use model::ModelError;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryListenerRepository {
    store: Arc<DashMap<ListenerId, Listener>>,
    reports: Arc<DashMap<ReportId, NaiveDateTime>>,
}

impl InMemoryListenerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListenerRepository for InMemoryListenerRepository {
    async fn find_by_id(&self, id: &ListenerId) -> Result<Option<Listener>, ListenerError> {
        Ok(self.store.get(id).map(|v| v.clone()))
    }

    async fn add_listening_seconds(
        &self,
        id: &ListenerId,
        delta: i64,
        report_id: Option<&ReportId>,
    ) -> Result<AccrualOutcome, ListenerError> {
        let now = Utc::now().naive_utc();
        if let Some(report_id) = report_id {
            match self.reports.entry(report_id.clone()) {
                Entry::Occupied(_) => {
                    let total_seconds = self.store.get(id).map(|l| l.total_seconds).unwrap_or(0);
                    return Ok(AccrualOutcome::Duplicate { total_seconds });
                }
                Entry::Vacant(slot) => {
                    slot.insert(now);
                }
            }
        }
        // 分片写锁保证同一收听者的累加串行执行
        let mut listener = self
            .store
            .entry(id.clone())
            .or_insert_with(|| Listener::new(id.clone(), String::new(), None));
        listener.total_seconds += delta;
        listener.last_seen_at = now;
        Ok(AccrualOutcome::Applied(Accrual::from_after(
            listener.total_seconds,
            delta,
        )))
    }

    async fn upsert_profile(
        &self,
        id: &ListenerId,
        nickname: &str,
        avatar: Option<&str>,
    ) -> Result<Listener, ListenerError> {
        let mut listener = self
            .store
            .entry(id.clone())
            .or_insert_with(|| Listener::new(id.clone(), String::new(), None));
        listener.nickname = nickname.to_string();
        listener.avatar = avatar.map(str::to_string);
        Ok(listener.clone())
    }

    async fn reset_total(&self, id: &ListenerId) -> Result<bool, ListenerError> {
        Ok(match self.store.get_mut(id) {
            Some(mut listener) => {
                listener.total_seconds = 0;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl LeaderboardRepository for InMemoryListenerRepository {
    async fn top_listeners(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, ModelError> {
        let mut entries: Vec<LeaderboardEntry> = self
            .store
            .iter()
            .filter(|e| e.total_seconds > 0)
            .map(|e| LeaderboardEntry {
                listener_id: e.id.to_string(),
                nickname: e.nickname.clone(),
                avatar: e.avatar.clone(),
                total_seconds: e.total_seconds,
                last_seen_at: e.last_seen_at,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_seconds
                .cmp(&a.total_seconds)
                .then_with(|| a.listener_id.cmp(&b.listener_id))
        });
        entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lid(raw: &str) -> ListenerId {
        raw.parse().unwrap()
    }

    #[tokio::test]
    async fn concurrent_increments_are_never_lost() {
        let repo = InMemoryListenerRepository::new();
        let id = lid("two-tabs");
        repo.add_listening_seconds(&id, 1000, None).await.unwrap();

        let handles: Vec<_> = (1..=64i64)
            .map(|s| {
                let repo = repo.clone();
                let id = id.clone();
                tokio::spawn(async move { repo.add_listening_seconds(&id, s, None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let total = repo.find_by_id(&id).await.unwrap().unwrap().total_seconds;
        assert_eq!(total, 1000 + (1..=64).sum::<i64>());
    }

    #[tokio::test]
    async fn outcome_carries_before_and_after() {
        let repo = InMemoryListenerRepository::new();
        let id = lid("a");
        repo.add_listening_seconds(&id, 3599, None).await.unwrap();

        let outcome = repo.add_listening_seconds(&id, 2, None).await.unwrap();

        assert_eq!(
            outcome,
            AccrualOutcome::Applied(Accrual {
                before: 3599,
                after: 3601
            })
        );
    }

    #[tokio::test]
    async fn report_token_is_applied_once() {
        let repo = InMemoryListenerRepository::new();
        let id = lid("a");
        let token: ReportId = "r-1".parse().unwrap();

        repo.add_listening_seconds(&id, 60, Some(&token)).await.unwrap();
        let retry = repo.add_listening_seconds(&id, 60, Some(&token)).await.unwrap();

        assert_eq!(retry, AccrualOutcome::Duplicate { total_seconds: 60 });
    }

    #[tokio::test]
    async fn profile_update_keeps_total() {
        let repo = InMemoryListenerRepository::new();
        let id = lid("a");
        repo.add_listening_seconds(&id, 42, None).await.unwrap();

        let listener = repo.upsert_profile(&id, "maya", Some("a.png")).await.unwrap();

        assert_eq!(listener.total_seconds, 42);
        assert_eq!(listener.avatar.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn leaderboard_orders_by_total_then_id() {
        let repo = InMemoryListenerRepository::new();
        for (id, secs) in [("b", 50), ("a", 50), ("c", 900)] {
            repo.add_listening_seconds(&lid(id), secs, None).await.unwrap();
        }
        repo.upsert_profile(&lid("idle"), "idle", None).await.unwrap();

        let top = repo.top_listeners(10).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|e| e.listener_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        assert_eq!(repo.top_listeners(1).await.unwrap().len(), 1);
    }
}
