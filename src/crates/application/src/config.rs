use domain::milestone::{CrossingPolicy, HourLadder};

/// 收听时长累计配置
pub trait AccrualConfig: Send + Sync {
    /// 单次上报允许的最大秒数
    fn max_report_secs(&self) -> i64;

    fn hour_ladder(&self) -> HourLadder;

    fn crossing_policy(&self) -> CrossingPolicy;
}

/// 公共列表（里程碑动态、排行榜）分页配置
pub trait FeedConfig: Send + Sync {
    fn default_limit(&self) -> u64;

    fn max_limit(&self) -> u64;

    /// 未指定时使用默认值，并限制在 `[1, max]` 内
    fn clamp_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or_else(|| self.default_limit())
            .clamp(1, self.max_limit().max(1))
    }
}
