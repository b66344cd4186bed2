use std::sync::Arc;

use super::shared::IdGenerator;
use crate::context::AppContext;
use crate::error::AppError;
use chrono::Utc;
use domain::milestone::{AppendOutcome, Milestone, MilestoneKind, MilestoneRepository};
use domain::value::{ListenerId, MilestoneId};
use log::{debug, info};

#[derive(Debug, Clone)]
pub struct RecordMilestoneCmd {
    pub listener_id: ListenerId,
    /// 随事件保存的资料快照
    pub nickname: String,
    pub avatar: Option<String>,
    pub kind: MilestoneKind,
    pub threshold: i64,
}

/// 里程碑记录器：每个 (listener, kind, threshold) 最多写入一次。
///
/// 是否达到阈值由调用方判断，记录器不再推导。唯一性最终由存储保证，
/// 并发写入中落败的一方得到 `None` 而不是错误。
pub struct MilestoneRecorder {
    milestone_repository: Arc<dyn MilestoneRepository>,
    id_generator: Arc<dyn IdGenerator>,
}

impl MilestoneRecorder {
    pub fn new(
        milestone_repository: Arc<dyn MilestoneRepository>,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            milestone_repository,
            id_generator,
        }
    }

    pub async fn recorded_thresholds(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
    ) -> Result<Vec<i64>, AppError> {
        Ok(self
            .milestone_repository
            .recorded_thresholds(listener_id, kind)
            .await?)
    }

    pub async fn record_milestone(
        &self,
        ctx: &AppContext,
        cmd: RecordMilestoneCmd,
    ) -> Result<Option<Milestone>, AppError> {
        let threshold = cmd.kind.key_threshold(cmd.threshold);
        if self
            .milestone_repository
            .exists(&cmd.listener_id, cmd.kind, threshold)
            .await?
        {
            debug!(
                "[{}] milestone {}:{} already recorded for {}",
                ctx.correlation_id, cmd.kind, threshold, cmd.listener_id
            );
            return Ok(None);
        }

        let id = self.id_generator.next_id().await?;
        let milestone = Milestone {
            id: MilestoneId::from(id),
            listener_id: cmd.listener_id,
            nickname: cmd.nickname,
            avatar: cmd.avatar,
            kind: cmd.kind,
            threshold,
            created_at: Utc::now().naive_utc(),
        };

        match self.milestone_repository.append(milestone).await? {
            AppendOutcome::Recorded(milestone) => {
                info!(
                    "[{}] milestone {}:{} reached by {}",
                    ctx.correlation_id, milestone.kind, milestone.threshold, milestone.listener_id
                );
                Ok(Some(milestone))
            }
            AppendOutcome::AlreadyRecorded => {
                debug!(
                    "[{}] lost race recording milestone {}:{}",
                    ctx.correlation_id, cmd.kind, threshold
                );
                Ok(None)
            }
        }
    }
}
