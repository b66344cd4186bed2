//! 服务测试共用的进程内替身

use crate::command::shared::IdGenerator;
use crate::config::{AccrualConfig, FeedConfig};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use domain::listener::{Accrual, AccrualOutcome, Listener, ListenerError, ListenerRepository};
use domain::milestone::{
    AppendOutcome, CrossingPolicy, HourLadder, Milestone, MilestoneError, MilestoneKind,
    MilestoneRepository,
};
use domain::value::{ListenerId, ReportId};
use model::milestone_feed::{MilestoneFeedEntry, MilestoneFeedRepository};
use model::ModelError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// 只保存累计秒数与资料的简易仓储，可切换为不可用
#[derive(Default)]
pub struct FakeListenerRepository {
    listeners: Mutex<HashMap<ListenerId, Listener>>,
    reports: Mutex<HashSet<ReportId>>,
    add_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeListenerRepository {
    pub fn seed(&self, id: &str, nickname: &str, total_seconds: i64) {
        let id: ListenerId = id.parse().unwrap();
        let mut listener = Listener::new(id.clone(), nickname.to_string(), None);
        listener.total_seconds = total_seconds;
        self.listeners.lock().unwrap().insert(id, listener);
    }

    pub fn total(&self, id: &str) -> Option<i64> {
        let id: ListenerId = id.parse().unwrap();
        self.listeners.lock().unwrap().get(&id).map(|l| l.total_seconds)
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn listeners(&self) -> Result<MutexGuard<'_, HashMap<ListenerId, Listener>>, ListenerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ListenerError::DbErr("connection refused".to_string()));
        }
        Ok(self.listeners.lock().unwrap())
    }
}

#[async_trait]
impl ListenerRepository for FakeListenerRepository {
    async fn find_by_id(&self, id: &ListenerId) -> Result<Option<Listener>, ListenerError> {
        Ok(self.listeners()?.get(id).cloned())
    }

    async fn add_listening_seconds(
        &self,
        id: &ListenerId,
        delta: i64,
        report_id: Option<&ReportId>,
    ) -> Result<AccrualOutcome, ListenerError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        let mut listeners = self.listeners()?;
        let listener = listeners
            .entry(id.clone())
            .or_insert_with(|| Listener::new(id.clone(), String::new(), None));
        if let Some(report_id) = report_id {
            if !self.reports.lock().unwrap().insert(report_id.clone()) {
                return Ok(AccrualOutcome::Duplicate {
                    total_seconds: listener.total_seconds,
                });
            }
        }
        listener.total_seconds += delta;
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
        let mut listeners = self.listeners()?;
        let listener = listeners
            .entry(id.clone())
            .or_insert_with(|| Listener::new(id.clone(), String::new(), None));
        listener.nickname = nickname.to_string();
        listener.avatar = avatar.map(str::to_string);
        Ok(listener.clone())
    }

    async fn reset_total(&self, id: &ListenerId) -> Result<bool, ListenerError> {
        Ok(self
            .listeners()?
            .get_mut(id)
            .map(|l| l.total_seconds = 0)
            .is_some())
    }
}

#[derive(Default)]
enum MilestoneMode {
    #[default]
    Normal,
    /// `exists` 未命中而 `append` 发现键已被占用，模拟并发写入方先到
    Racing,
    Unavailable,
    /// 第一次 `append` 失败，之后恢复正常
    FailOnce,
}

#[derive(Default)]
pub struct FakeMilestoneRepository {
    rows: Mutex<Vec<Milestone>>,
    mode: MilestoneMode,
    failed: AtomicBool,
}

impl FakeMilestoneRepository {
    pub fn racing() -> Self {
        Self {
            mode: MilestoneMode::Racing,
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: MilestoneMode::Unavailable,
            ..Default::default()
        }
    }

    pub fn failing_once() -> Self {
        Self {
            mode: MilestoneMode::FailOnce,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn thresholds_for(&self, listener_id: &str) -> Vec<i64> {
        let mut thresholds: Vec<i64> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.listener_id.as_str() == listener_id)
            .map(|m| m.threshold)
            .collect();
        thresholds.sort_unstable();
        thresholds
    }

    pub fn snapshot_nickname(&self, listener_id: &str, threshold: i64) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.listener_id.as_str() == listener_id && m.threshold == threshold)
            .map(|m| m.nickname.clone())
    }
}

impl FakeMilestoneRepository {
    fn check_available(&self) -> Result<(), MilestoneError> {
        match self.mode {
            MilestoneMode::Unavailable => Err(MilestoneError::DbErr("timeout".to_string())),
            _ => Ok(()),
        }
    }

    fn matching(&self, listener_id: &ListenerId, kind: MilestoneKind) -> Vec<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.listener_id == listener_id && m.kind == kind)
            .map(|m| m.threshold)
            .collect()
    }
}

#[async_trait]
impl MilestoneRepository for FakeMilestoneRepository {
    async fn exists(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
        threshold: i64,
    ) -> Result<bool, MilestoneError> {
        self.check_available()?;
        if let MilestoneMode::Racing = self.mode {
            return Ok(false);
        }
        Ok(self.matching(listener_id, kind).contains(&threshold))
    }

    async fn recorded_thresholds(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
    ) -> Result<Vec<i64>, MilestoneError> {
        self.check_available()?;
        Ok(self.matching(listener_id, kind))
    }

    async fn append(&self, milestone: Milestone) -> Result<AppendOutcome, MilestoneError> {
        self.check_available()?;
        match self.mode {
            MilestoneMode::Racing => return Ok(AppendOutcome::AlreadyRecorded),
            MilestoneMode::FailOnce if !self.failed.swap(true, Ordering::SeqCst) => {
                return Err(MilestoneError::DbErr("connection reset".to_string()));
            }
            _ => {}
        }
        if self
            .matching(&milestone.listener_id, milestone.kind)
            .contains(&milestone.threshold)
        {
            return Ok(AppendOutcome::AlreadyRecorded);
        }
        self.rows.lock().unwrap().push(milestone.clone());
        Ok(AppendOutcome::Recorded(milestone))
    }
}

#[derive(Default)]
pub struct FakeFeedRepository {
    limits: Mutex<Vec<u64>>,
}

impl FakeFeedRepository {
    pub fn requested_limits(&self) -> Vec<u64> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl MilestoneFeedRepository for FakeFeedRepository {
    async fn list_milestones(
        &self,
        _since: Option<NaiveDateTime>,
        limit: u64,
    ) -> Result<Vec<MilestoneFeedEntry>, ModelError> {
        self.limits.lock().unwrap().push(limit);
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct SequenceIdGenerator {
    next: AtomicI64,
}

#[async_trait]
impl IdGenerator for SequenceIdGenerator {
    async fn next_id(&self) -> Result<i64, AppError> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub struct StaticAccrualConfig {
    policy: CrossingPolicy,
}

impl StaticAccrualConfig {
    pub fn with_policy(policy: CrossingPolicy) -> Self {
        Self { policy }
    }
}

impl AccrualConfig for StaticAccrualConfig {
    fn max_report_secs(&self) -> i64 {
        86_400
    }

    fn hour_ladder(&self) -> HourLadder {
        HourLadder::default()
    }

    fn crossing_policy(&self) -> CrossingPolicy {
        self.policy
    }
}

pub struct StaticFeedConfig;

impl FeedConfig for StaticFeedConfig {
    fn default_limit(&self) -> u64 {
        20
    }

    fn max_limit(&self) -> u64 {
        100
    }
}
