use super::db_data::milestone as milestone_db;
use async_trait::async_trait;
use domain::milestone::{AppendOutcome, Milestone, MilestoneError, MilestoneKind, MilestoneRepository};
use domain::value::ListenerId;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

#[derive(Clone)]
pub struct MilestoneRepositoryImpl {
    db: sea_orm::DbConn,
}

impl MilestoneRepositoryImpl {
    pub fn new(db: sea_orm::DbConn) -> Self {
        Self { db }
    }
}

#[inline]
fn map_db_error(e: DbErr) -> MilestoneError {
    MilestoneError::DbErr(e.to_string())
}

/// 唯一索引 (listener_id, kind, threshold) 兜底并发重复写入
fn append_stmt(milestone: &Milestone) -> Insert<milestone_db::ActiveModel> {
    milestone_db::Entity::insert(milestone_db::ActiveModel::from(milestone)).on_conflict(
        OnConflict::columns([
            milestone_db::Column::ListenerId,
            milestone_db::Column::Kind,
            milestone_db::Column::Threshold,
        ])
        .do_nothing()
        .to_owned(),
    )
}

#[async_trait]
impl MilestoneRepository for MilestoneRepositoryImpl {
    async fn exists(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
        threshold: i64,
    ) -> Result<bool, MilestoneError> {
        let count = milestone_db::Entity::find()
            .filter(milestone_db::Column::ListenerId.eq(listener_id.to_string()))
            .filter(milestone_db::Column::Kind.eq(kind.name()))
            .filter(milestone_db::Column::Threshold.eq(threshold))
            .count(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(count > 0)
    }

    async fn recorded_thresholds(
        &self,
        listener_id: &ListenerId,
        kind: MilestoneKind,
    ) -> Result<Vec<i64>, MilestoneError> {
        milestone_db::Entity::find()
            .select_only()
            .column(milestone_db::Column::Threshold)
            .filter(milestone_db::Column::ListenerId.eq(listener_id.to_string()))
            .filter(milestone_db::Column::Kind.eq(kind.name()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(map_db_error)
    }

    async fn append(&self, milestone: Milestone) -> Result<AppendOutcome, MilestoneError> {
        let inserted = append_stmt(&milestone)
            .exec_without_returning(&self.db)
            .await
            .map_err(map_db_error)?;
        if inserted == 0 {
            return Ok(AppendOutcome::AlreadyRecorded);
        }
        Ok(AppendOutcome::Recorded(milestone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::value::MilestoneId;

    #[test]
    fn append_leaves_duplicates_to_the_unique_index() {
        let milestone = Milestone {
            id: MilestoneId::from(42),
            listener_id: "tab-1".parse().unwrap(),
            nickname: "noa".to_string(),
            avatar: None,
            kind: MilestoneKind::ListeningHours,
            threshold: 5,
            created_at: Utc::now().naive_utc(),
        };

        let sql = append_stmt(&milestone).build(DbBackend::Postgres).to_string();

        assert!(sql.starts_with(r#"INSERT INTO "milestone""#), "{}", sql);
        assert!(
            sql.contains(r#"ON CONFLICT ("listener_id", "kind", "threshold") DO NOTHING"#),
            "{}",
            sql
        );
    }
}
