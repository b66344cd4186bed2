use std::sync::Arc;

use super::milestone::{MilestoneRecorder, RecordMilestoneCmd};
use crate::context::AppContext;
use crate::error::AppError;
use domain::listener::{normalize_nickname, Listener, ListenerRepository};
use domain::milestone::{Milestone, MilestoneKind};
use domain::value::ListenerId;
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct RegisterListenerCmd {
    pub listener_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
}

pub struct ListenerService {
    listener_repository: Arc<dyn ListenerRepository>,
    recorder: Arc<MilestoneRecorder>,
}

impl ListenerService {
    pub fn new(
        listener_repository: Arc<dyn ListenerRepository>,
        recorder: Arc<MilestoneRecorder>,
    ) -> Self {
        Self {
            listener_repository,
            recorder,
        }
    }

    /// 创建或更新收听者资料，不影响累计时长
    pub async fn register_listener(
        &self,
        ctx: &AppContext,
        cmd: RegisterListenerCmd,
    ) -> Result<Listener, AppError> {
        let listener_id: ListenerId = cmd.listener_id.parse()?;
        let nickname = normalize_nickname(&cmd.nickname)?;
        let avatar = cmd
            .avatar
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let listener = self
            .listener_repository
            .upsert_profile(&listener_id, &nickname, avatar)
            .await?;
        info!(
            "[{}] listener {} registered as {}",
            ctx.correlation_id, listener.id, listener.nickname
        );
        Ok(listener)
    }

    /// 管理员重置，唯一会降低累计时长的操作
    pub async fn reset_listening(
        &self,
        ctx: &AppContext,
        listener_id: &str,
    ) -> Result<bool, AppError> {
        let listener_id: ListenerId = listener_id.parse()?;
        let reset = self.listener_repository.reset_total(&listener_id).await?;
        if reset {
            warn!(
                "[{}] listening total of {} reset by admin",
                ctx.correlation_id, listener_id
            );
        }
        Ok(reset)
    }

    pub async fn record_app_installed(
        &self,
        ctx: &AppContext,
        listener_id: &str,
    ) -> Result<Option<Milestone>, AppError> {
        let listener_id: ListenerId = listener_id.parse()?;
        let listener = self
            .listener_repository
            .find_by_id(&listener_id)
            .await?
            .ok_or_else(|| {
                AppError::AggregateNotFound("Listener".to_string(), listener_id.to_string())
            })?;
        self.recorder
            .record_milestone(
                ctx,
                RecordMilestoneCmd {
                    listener_id: listener.id,
                    nickname: listener.nickname,
                    avatar: listener.avatar,
                    kind: MilestoneKind::AppInstalled,
                    threshold: 0,
                },
            )
            .await
    }
}
