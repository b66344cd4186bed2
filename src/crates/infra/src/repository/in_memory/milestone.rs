use async_trait::async_trait;
use chrono::NaiveDateTime;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domain::milestone::{AppendOutcome, Milestone, MilestoneError, MilestoneKind, MilestoneRepository};
use domain::value::ListenerId;
use model::milestone_feed::{MilestoneFeedEntry, MilestoneFeedRepository};
use model::ModelError;
use std::sync::Arc;

type MilestoneKey = (ListenerId, MilestoneKind, i64);

#[derive(Clone, Default)]
pub struct InMemoryMilestoneRepository {
    store: Arc<DashMap<MilestoneKey, Milestone>>,
}

impl InMemoryMilestoneRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MilestoneRepository for InMemoryMilestoneRepository {
    async fn exists(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
        threshold: i64,
    ) -> Result<bool, MilestoneError> {
        Ok(self
            .store
            .contains_key(&(listener_id.clone(), kind, threshold)))
    }

    async fn recorded_thresholds(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
    ) -> Result<Vec<i64>, MilestoneError> {
        Ok(self
            .store
            .iter()
            .filter(|e| &e.key().0 == listener_id && e.key().1 == kind)
            .map(|e| e.key().2)
            .collect())
    }

    async fn append(&self, milestone: Milestone) -> Result<AppendOutcome, MilestoneError> {
        let key = (milestone.listener_id.clone(), milestone.kind, milestone.threshold);
        match self.store.entry(key) {
            Entry::Occupied(_) => Ok(AppendOutcome::AlreadyRecorded),
            Entry::Vacant(slot) => {
                slot.insert(milestone.clone());
                Ok(AppendOutcome::Recorded(milestone))
            }
        }
    }
}

#[async_trait]
impl MilestoneFeedRepository for InMemoryMilestoneRepository {
    async fn list_milestones(
        &self,
        since: Option<NaiveDateTime>,
        limit: u64,
    ) -> Result<Vec<MilestoneFeedEntry>, ModelError> {
        let mut rows: Vec<Milestone> = self
            .store
            .iter()
            .filter(|e| since.map_or(true, |since| e.created_at > since))
            .map(|e| e.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i64().cmp(&a.id.as_i64()))
        });
        Ok(rows
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|m| MilestoneFeedEntry {
                id: m.id.as_i64(),
                listener_id: m.listener_id.to_string(),
                nickname: m.nickname,
                avatar: m.avatar,
                kind: m.kind.name().to_string(),
                threshold: m.threshold,
                created_at: m.created_at,
            })
            .collect())
    }
}
