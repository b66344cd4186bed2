use crate::value::{ListenerId, MilestoneId};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const DEFAULT_HOUR_THRESHOLDS: [i64; 8] = [1, 5, 10, 25, 50, 100, 250, 500];

#[derive(Error, Debug)]
pub enum MilestoneError {
    #[error("Unknown kind: {0}")]
    UnknownKind(String),
    #[error("Unknown crossing policy: {0}")]
    UnknownPolicy(String),
    #[error("Invalid threshold ladder: {0}")]
    InvalidLadder(String),
    #[error("Database error: {0}")]
    DbErr(String),
}

/// 里程碑是按 (kind) 还是按 (kind, threshold) 去重
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
    OncePerListener,
    PerThreshold,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MilestoneKind {
    ListeningHours,
    AppInstalled,
}

impl MilestoneKind {
    pub fn name(&self) -> &'static str {
        match self {
            MilestoneKind::ListeningHours => "listening_hours",
            MilestoneKind::AppInstalled => "app_installed",
        }
    }

    pub fn uniqueness(&self) -> Uniqueness {
        match self {
            MilestoneKind::ListeningHours => Uniqueness::PerThreshold,
            MilestoneKind::AppInstalled => Uniqueness::OncePerListener,
        }
    }

    /// 入库的阈值：每人一次的类型固定为 0，使 (listener, kind, threshold) 唯一索引同时覆盖两种去重范围
    pub fn key_threshold(&self, threshold: i64) -> i64 {
        match self.uniqueness() {
            Uniqueness::OncePerListener => 0,
            Uniqueness::PerThreshold => threshold,
        }
    }
}

impl FromStr for MilestoneKind {
    type Err = MilestoneError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listening_hours" => Ok(MilestoneKind::ListeningHours),
            "app_installed" => Ok(MilestoneKind::AppInstalled),
            _ => Err(MilestoneError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 里程碑事件，创建后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub id: MilestoneId,
    pub listener_id: ListenerId,
    pub nickname: String,
    pub avatar: Option<String>,
    pub kind: MilestoneKind,
    pub threshold: i64,
    pub created_at: NaiveDateTime,
}

/// 小时阈值阶梯：升序、去重、均为正数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourLadder(Vec<i64>);

impl HourLadder {
    pub fn new(mut thresholds: Vec<i64>) -> Result<Self, MilestoneError> {
        if let Some(bad) = thresholds.iter().find(|t| **t <= 0) {
            return Err(MilestoneError::InvalidLadder(format!(
                "threshold must be positive, got {}",
                bad
            )));
        }
        thresholds.sort_unstable();
        thresholds.dedup();
        Ok(Self(thresholds))
    }

    pub fn thresholds(&self) -> &[i64] {
        &self.0
    }

    /// 累计小时数已达到的阈值（`t <= after_hours`），升序
    pub fn reached(&self, after_hours: i64) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied().take_while(move |t| *t <= after_hours)
    }
}

impl Default for HourLadder {
    fn default() -> Self {
        Self(DEFAULT_HOUR_THRESHOLDS.to_vec())
    }
}

/// 一次上报跨越多个阈值时记录多少条里程碑。
/// 候选阈值是已达到但尚未记录的阈值，因此上次写入失败的里程碑会在下一次上报时补记。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossingPolicy {
    /// 每次上报最多记录一条：最低的未记录阈值，其余留给后续上报
    #[default]
    LowestOnly,
    /// 记录全部未记录阈值
    AllCrossed,
}

impl CrossingPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            CrossingPolicy::LowestOnly => "lowest_only",
            CrossingPolicy::AllCrossed => "all_crossed",
        }
    }

    pub fn select(&self, ladder: &HourLadder, after_hours: i64, recorded: &[i64]) -> Vec<i64> {
        let missing = ladder
            .reached(after_hours)
            .filter(|t| !recorded.contains(t));
        match self {
            CrossingPolicy::LowestOnly => missing.take(1).collect(),
            CrossingPolicy::AllCrossed => missing.collect(),
        }
    }
}

impl FromStr for CrossingPolicy {
    type Err = MilestoneError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lowest_only" => Ok(CrossingPolicy::LowestOnly),
            "all_crossed" => Ok(CrossingPolicy::AllCrossed),
            _ => Err(MilestoneError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for CrossingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Recorded(Milestone),
    /// 唯一键已被占用（可能是并发写入方先到）
    AlreadyRecorded,
}

// 仓储接口
#[async_trait]
pub trait MilestoneRepository: Send + Sync {
    async fn exists(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
        threshold: i64,
    ) -> Result<bool, MilestoneError>;

    /// 该收听者某类型下已记录的全部阈值
    async fn recorded_thresholds(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
    ) -> Result<Vec<i64>, MilestoneError>;

    /// (listener, kind, threshold) 已存在时不写入
    async fn append(&self, milestone: Milestone) -> Result<AppendOutcome, MilestoneError>;
}
