use std::sync::Arc;

use super::milestone::{MilestoneRecorder, RecordMilestoneCmd};
use crate::config::AccrualConfig;
use crate::context::AppContext;
use crate::error::AppError;
use domain::listener::{AccrualOutcome, ListenerRepository, SECONDS_PER_HOUR};
use domain::milestone::MilestoneKind;
use domain::value::{ListenerId, ReportId};
use log::{debug, error};

/// 客户端批量上报的收听时长，原始字段由服务校验
#[derive(Debug, Clone)]
pub struct ReportListeningCmd {
    pub listener_id: String,
    pub seconds: Option<i64>,
    /// 可选的客户端幂等令牌，同一令牌只累加一次
    pub report_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub accepted: bool,
    pub total_seconds: i64,
    /// 上报令牌已生效过，本次未累加
    pub duplicate: bool,
    /// 本次上报新记录的小时阈值
    pub milestones: Vec<i64>,
}

pub struct ListeningTimeService {
    listener_repository: Arc<dyn ListenerRepository>,
    recorder: Arc<MilestoneRecorder>,
    config: Arc<dyn AccrualConfig>,
}

impl ListeningTimeService {
    pub fn new(
        listener_repository: Arc<dyn ListenerRepository>,
        recorder: Arc<MilestoneRecorder>,
        config: Arc<dyn AccrualConfig>,
    ) -> Self {
        Self {
            listener_repository,
            recorder,
            config,
        }
    }

    fn validate(
        &self,
        cmd: ReportListeningCmd,
    ) -> Result<(ListenerId, i64, Option<ReportId>), AppError> {
        let listener_id: ListenerId = cmd.listener_id.parse()?;
        let seconds = match cmd.seconds {
            Some(s) if s > 0 => s,
            Some(s) => {
                return Err(AppError::InvalidInput(format!(
                    "seconds must be a positive integer, got {}",
                    s
                )))
            }
            None => return Err(AppError::InvalidInput("seconds is required".to_string())),
        };
        let max = self.config.max_report_secs();
        if seconds > max {
            return Err(AppError::InvalidInput(format!(
                "seconds must be at most {}, got {}",
                max, seconds
            )));
        }
        let report_id = cmd
            .report_id
            .as_deref()
            .map(str::parse::<ReportId>)
            .transpose()?;
        Ok((listener_id, seconds, report_id))
    }

    /// 累计收听时长，并为已达到但尚未记录的小时阈值补记里程碑
    pub async fn report_listening(
        &self,
        ctx: &AppContext,
        cmd: ReportListeningCmd,
    ) -> Result<ReportOutcome, AppError> {
        let (listener_id, seconds, report_id) = self.validate(cmd)?;

        let outcome = self
            .listener_repository
            .add_listening_seconds(&listener_id, seconds, report_id.as_ref())
            .await
            .map_err(|e| {
                error!(
                    "[{}] failed to add {}s for {}: {}",
                    ctx.correlation_id, seconds, listener_id, e
                );
                AppError::from(e)
            })?;

        let duplicate = match outcome {
            AccrualOutcome::Applied(accrual) => {
                debug!(
                    "[{}] {} listened {}s: {} -> {}",
                    ctx.correlation_id, listener_id, seconds, accrual.before, accrual.after
                );
                false
            }
            AccrualOutcome::Duplicate { .. } => {
                debug!(
                    "[{}] report {:?} for {} already applied",
                    ctx.correlation_id, report_id, listener_id
                );
                true
            }
        };
        let total_seconds = outcome.total_seconds();

        // 重复令牌也要检查：首次上报可能在累加成功后写里程碑失败
        let milestones = self
            .record_reached_milestones(ctx, &listener_id, total_seconds)
            .await?;

        Ok(ReportOutcome {
            accepted: true,
            total_seconds,
            duplicate,
            milestones,
        })
    }

    async fn record_reached_milestones(
        &self,
        ctx: &AppContext,
        listener_id: &ListenerId,
        total_seconds: i64,
    ) -> Result<Vec<i64>, AppError> {
        let ladder = self.config.hour_ladder();
        let after_hours = total_seconds.div_euclid(SECONDS_PER_HOUR);
        if ladder.reached(after_hours).next().is_none() {
            return Ok(Vec::new());
        }

        let recorded = self
            .recorder
            .recorded_thresholds(listener_id, MilestoneKind::ListeningHours)
            .await?;
        let thresholds = self
            .config
            .crossing_policy()
            .select(&ladder, after_hours, &recorded);
        if thresholds.is_empty() {
            return Ok(Vec::new());
        }

        let (nickname, avatar) = self
            .listener_repository
            .find_by_id(listener_id)
            .await?
            .map(|l| (l.nickname, l.avatar))
            .unwrap_or_default();
        let mut milestones = Vec::with_capacity(thresholds.len());
        for threshold in thresholds {
            let recorded = self
                .recorder
                .record_milestone(
                    ctx,
                    RecordMilestoneCmd {
                        listener_id: listener_id.clone(),
                        nickname: nickname.clone(),
                        avatar: avatar.clone(),
                        kind: MilestoneKind::ListeningHours,
                        threshold,
                    },
                )
                .await?;
            if let Some(milestone) = recorded {
                milestones.push(milestone.threshold);
            }
        }
        Ok(milestones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FakeListenerRepository, FakeMilestoneRepository, SequenceIdGenerator, StaticAccrualConfig,
    };
    use domain::milestone::CrossingPolicy;

    struct Fixture {
        listeners: Arc<FakeListenerRepository>,
        milestones: Arc<FakeMilestoneRepository>,
        service: ListeningTimeService,
    }

    fn fixture(policy: CrossingPolicy) -> Fixture {
        fixture_with(policy, FakeMilestoneRepository::default())
    }

    fn fixture_with(policy: CrossingPolicy, milestones: FakeMilestoneRepository) -> Fixture {
        let listeners = Arc::new(FakeListenerRepository::default());
        let milestones = Arc::new(milestones);
        let recorder = Arc::new(MilestoneRecorder::new(
            milestones.clone(),
            Arc::new(SequenceIdGenerator::default()),
        ));
        let service = ListeningTimeService::new(
            listeners.clone(),
            recorder,
            Arc::new(StaticAccrualConfig::with_policy(policy)),
        );
        Fixture {
            listeners,
            milestones,
            service,
        }
    }

    fn report(seconds: i64) -> ReportListeningCmd {
        ReportListeningCmd {
            listener_id: "listener-1".to_string(),
            seconds: Some(seconds),
            report_id: None,
        }
    }

    #[tokio::test]
    async fn crossing_exactly_one_threshold() {
        let f = fixture(CrossingPolicy::LowestOnly);
        f.listeners.seed("listener-1", "noa", 3599);

        let outcome = f
            .service
            .report_listening(&AppContext::new(), report(2))
            .await
            .unwrap();

        assert_eq!(outcome.total_seconds, 3601);
        assert_eq!(outcome.milestones, vec![1]);
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1]);
        assert_eq!(f.milestones.snapshot_nickname("listener-1", 1).as_deref(), Some("noa"));
    }

    #[tokio::test]
    async fn large_jump_records_lowest_only_by_default() {
        let f = fixture(CrossingPolicy::LowestOnly);

        let outcome = f
            .service
            .report_listening(&AppContext::new(), report(20000))
            .await
            .unwrap();

        assert_eq!(outcome.milestones, vec![1]);
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1]);
    }

    #[tokio::test]
    async fn large_jump_records_every_threshold_when_configured() {
        let f = fixture(CrossingPolicy::AllCrossed);

        let outcome = f
            .service
            .report_listening(&AppContext::new(), report(20000))
            .await
            .unwrap();

        assert_eq!(outcome.milestones, vec![1, 5]);
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1, 5]);
    }

    #[tokio::test]
    async fn non_positive_seconds_are_rejected_without_side_effects() {
        let f = fixture(CrossingPolicy::LowestOnly);
        f.listeners.seed("listener-1", "noa", 100);

        for seconds in [0, -5] {
            let err = f
                .service
                .report_listening(&AppContext::new(), report(seconds))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
        let missing = ReportListeningCmd {
            seconds: None,
            ..report(1)
        };
        assert!(f
            .service
            .report_listening(&AppContext::new(), missing)
            .await
            .is_err());

        assert_eq!(f.listeners.total("listener-1"), Some(100));
        assert_eq!(f.listeners.add_calls(), 0);
    }

    #[tokio::test]
    async fn blank_listener_and_oversized_report_are_rejected() {
        let f = fixture(CrossingPolicy::LowestOnly);
        let blank = ReportListeningCmd {
            listener_id: "  ".to_string(),
            ..report(10)
        };
        assert!(f
            .service
            .report_listening(&AppContext::new(), blank)
            .await
            .is_err());
        assert!(f
            .service
            .report_listening(&AppContext::new(), report(86_401))
            .await
            .is_err());
        assert_eq!(f.listeners.add_calls(), 0);
    }

    #[tokio::test]
    async fn repeated_report_token_is_counted_once() {
        let f = fixture(CrossingPolicy::LowestOnly);
        let cmd = ReportListeningCmd {
            report_id: Some("r-1".to_string()),
            ..report(120)
        };

        let first = f
            .service
            .report_listening(&AppContext::new(), cmd.clone())
            .await
            .unwrap();
        let retry = f
            .service
            .report_listening(&AppContext::new(), cmd)
            .await
            .unwrap();

        assert!(!first.duplicate);
        assert!(retry.duplicate);
        assert_eq!(retry.total_seconds, 120);
        assert_eq!(f.listeners.total("listener-1"), Some(120));
    }

    #[tokio::test]
    async fn storage_outage_surfaces_as_transient() {
        let f = fixture(CrossingPolicy::LowestOnly);
        f.listeners.set_unavailable(true);

        let err = f
            .service
            .report_listening(&AppContext::new(), report(30))
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(f.milestones.thresholds_for("listener-1").is_empty());
    }

    #[tokio::test]
    async fn already_crossed_threshold_is_not_repeated() {
        let f = fixture(CrossingPolicy::LowestOnly);
        f.listeners.seed("listener-1", "noa", 3599);
        let ctx = AppContext::new();

        f.service.report_listening(&ctx, report(2)).await.unwrap();
        let later = f.service.report_listening(&ctx, report(60)).await.unwrap();

        assert!(later.milestones.is_empty());
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1]);
    }

    #[tokio::test]
    async fn milestone_lost_to_outage_is_recorded_on_token_retry() {
        let f = fixture_with(
            CrossingPolicy::LowestOnly,
            FakeMilestoneRepository::failing_once(),
        );
        f.listeners.seed("listener-1", "noa", 3599);
        let cmd = ReportListeningCmd {
            report_id: Some("r-1".to_string()),
            ..report(2)
        };

        let err = f
            .service
            .report_listening(&AppContext::new(), cmd.clone())
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(f.listeners.total("listener-1"), Some(3601));

        let retry = f
            .service
            .report_listening(&AppContext::new(), cmd)
            .await
            .unwrap();

        assert!(retry.duplicate);
        assert_eq!(retry.total_seconds, 3601);
        assert_eq!(retry.milestones, vec![1]);
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1]);
    }

    #[tokio::test]
    async fn milestone_lost_to_outage_is_recorded_on_plain_retry() {
        let f = fixture_with(
            CrossingPolicy::LowestOnly,
            FakeMilestoneRepository::failing_once(),
        );
        f.listeners.seed("listener-1", "noa", 3599);

        assert!(f
            .service
            .report_listening(&AppContext::new(), report(2))
            .await
            .is_err());
        let retry = f
            .service
            .report_listening(&AppContext::new(), report(2))
            .await
            .unwrap();

        assert_eq!(retry.total_seconds, 3603);
        assert_eq!(retry.milestones, vec![1]);
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1]);
        assert_eq!(f.milestones.snapshot_nickname("listener-1", 1).as_deref(), Some("noa"));
    }

    #[tokio::test]
    async fn skipped_thresholds_follow_one_per_report() {
        let f = fixture(CrossingPolicy::LowestOnly);
        let ctx = AppContext::new();

        let jump = f.service.report_listening(&ctx, report(20000)).await.unwrap();
        let next = f.service.report_listening(&ctx, report(10)).await.unwrap();
        let after = f.service.report_listening(&ctx, report(10)).await.unwrap();

        assert_eq!(jump.milestones, vec![1]);
        assert_eq!(next.milestones, vec![5]);
        assert!(after.milestones.is_empty());
        assert_eq!(f.milestones.thresholds_for("listener-1"), vec![1, 5]);
    }
}
