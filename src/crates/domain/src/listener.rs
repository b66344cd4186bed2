use crate::value::{ListenerId, ReportId};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use thiserror::Error;

pub const SECONDS_PER_HOUR: i64 = 3600;
/// 昵称最大长度
pub const MAX_NICKNAME_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Listener not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    DbErr(String),
}

/// 收听者账户。累计收听秒数只增不减（管理员重置除外）。
#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub id: ListenerId,
    pub nickname: String,
    pub avatar: Option<String>,
    pub total_seconds: i64,
    pub last_seen_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Listener {
    pub fn new(id: ListenerId, nickname: String, avatar: Option<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id,
            nickname,
            avatar,
            total_seconds: 0,
            last_seen_at: now,
            created_at: now,
        }
    }

    pub fn total_hours(&self) -> i64 {
        self.total_seconds.div_euclid(SECONDS_PER_HOUR)
    }
}

/// 校验并规整昵称（去除首尾空白）
pub fn normalize_nickname(raw: &str) -> Result<String, ListenerError> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(ListenerError::ValidationError(
            "nickname must not be empty".to_string(),
        ));
    }
    if nickname.chars().count() > MAX_NICKNAME_LEN {
        return Err(ListenerError::ValidationError(format!(
            "nickname must be at most {} characters",
            MAX_NICKNAME_LEN
        )));
    }
    Ok(nickname.to_string())
}

/// 一次已生效的累加：累加前后的总秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub before: i64,
    pub after: i64,
}

impl Accrual {
    /// 由原子累加返回的新总数反推累加前的值
    pub fn from_after(after: i64, delta: i64) -> Self {
        Self {
            before: after - delta,
            after,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    Applied(Accrual),
    /// 上报令牌已被消费，本次未累加
    Duplicate { total_seconds: i64 },
}

impl AccrualOutcome {
    pub fn total_seconds(&self) -> i64 {
        match self {
            AccrualOutcome::Applied(accrual) => accrual.after,
            AccrualOutcome::Duplicate { total_seconds } => *total_seconds,
        }
    }
}

// 仓储接口
#[async_trait]
pub trait ListenerRepository: Send + Sync {
    async fn find_by_id(&self, id: &ListenerId) -> Result<Option<Listener>, ListenerError>;

    /// 在存储层以单个原子操作累加秒数，收听者不存在时自动创建。
    /// 提供 `report_id` 时同一令牌最多生效一次。
    async fn add_listening_seconds(
        &self,
        id: &ListenerId,
        delta: i64,
        report_id: Option<&ReportId>,
    ) -> Result<AccrualOutcome, ListenerError>;

    /// 创建收听者或更新昵称/头像，不改动累计时长
    async fn upsert_profile(
        &self,
        id: &ListenerId,
        nickname: &str,
        avatar: Option<&str>,
    ) -> Result<Listener, ListenerError>;

    /// 累计时长清零，收听者不存在时返回 false
    async fn reset_total(&self, id: &ListenerId) -> Result<bool, ListenerError>;
}
