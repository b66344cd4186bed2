use super::db_data::{listener as listener_db, listening_report as report_db};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use domain::listener::{Accrual, AccrualOutcome, Listener, ListenerError, ListenerRepository};
use domain::value::{ListenerId, ReportId};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;

#[derive(Clone)]
pub struct ListenerRepositoryImpl {
    db: sea_orm::DbConn,
}

impl ListenerRepositoryImpl {
    pub fn new(db: sea_orm::DbConn) -> Self {
        Self { db }
    }
}

#[inline]
fn map_db_error(e: DbErr) -> ListenerError {
    ListenerError::DbErr(e.to_string())
}

/// 单条 INSERT ... ON CONFLICT DO UPDATE：由数据库在已存总数上加 `delta`，并发上报不会互相覆盖
fn increment_stmt(id: &ListenerId, delta: i64, now: NaiveDateTime) -> Insert<listener_db::ActiveModel> {
    let active_model = listener_db::ActiveModel {
        id: Set(id.to_string()),
        nickname: Set(String::new()),
        avatar: Set(None),
        total_seconds: Set(delta),
        last_seen_at: Set(now),
        created_at: Set(now),
    };
    listener_db::Entity::insert(active_model).on_conflict(
        OnConflict::column(listener_db::Column::Id)
            .value(
                listener_db::Column::TotalSeconds,
                Expr::col((listener_db::Entity, listener_db::Column::TotalSeconds)).add(delta),
            )
            .value(listener_db::Column::LastSeenAt, Expr::value(now))
            .to_owned(),
    )
}

/// 返回累加后的总秒数（RETURNING）
async fn add_seconds<C: ConnectionTrait>(
    conn: &C,
    id: &ListenerId,
    delta: i64,
    now: NaiveDateTime,
) -> Result<i64, ListenerError> {
    let row = increment_stmt(id, delta, now)
        .exec_with_returning(conn)
        .await
        .map_err(map_db_error)?;
    Ok(row.total_seconds)
}

async fn current_total<C: ConnectionTrait>(conn: &C, id: &ListenerId) -> Result<i64, ListenerError> {
    let row = listener_db::Entity::find_by_id(id.to_string())
        .one(conn)
        .await
        .map_err(map_db_error)?;
    Ok(row.map(|r| r.total_seconds).unwrap_or(0))
}

#[async_trait]
impl ListenerRepository for ListenerRepositoryImpl {
    async fn find_by_id(&self, id: &ListenerId) -> Result<Option<Listener>, ListenerError> {
        let row = listener_db::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(map_db_error)?;
        row.map(Listener::try_from).transpose()
    }

    async fn add_listening_seconds(
        &self,
        id: &ListenerId,
        delta: i64,
        report_id: Option<&ReportId>,
    ) -> Result<AccrualOutcome, ListenerError> {
        let now = Utc::now().naive_utc();
        let Some(report_id) = report_id else {
            let after = add_seconds(&self.db, id, delta, now).await?;
            return Ok(AccrualOutcome::Applied(Accrual::from_after(after, delta)));
        };

        // 令牌写入与累加在同一事务内：令牌已存在则跳过累加
        let id = id.clone();
        let report_id = report_id.clone();
        self.db
            .transaction::<_, AccrualOutcome, ListenerError>(move |txn| {
                Box::pin(async move {
                    let token = report_db::ActiveModel {
                        report_id: Set(report_id.to_string()),
                        listener_id: Set(id.to_string()),
                        seconds: Set(delta),
                        received_at: Set(now),
                    };
                    let inserted = report_db::Entity::insert(token)
                        .on_conflict(
                            OnConflict::column(report_db::Column::ReportId)
                                .do_nothing()
                                .to_owned(),
                        )
                        .exec_without_returning(txn)
                        .await
                        .map_err(map_db_error)?;
                    if inserted == 0 {
                        let total_seconds = current_total(txn, &id).await?;
                        return Ok(AccrualOutcome::Duplicate { total_seconds });
                    }
                    let after = add_seconds(txn, &id, delta, now).await?;
                    Ok(AccrualOutcome::Applied(Accrual::from_after(after, delta)))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(e) => map_db_error(e),
                TransactionError::Transaction(e) => e,
            })
    }

    async fn upsert_profile(
        &self,
        id: &ListenerId,
        nickname: &str,
        avatar: Option<&str>,
    ) -> Result<Listener, ListenerError> {
        let now = Utc::now().naive_utc();
        let active_model = listener_db::ActiveModel {
            id: Set(id.to_string()),
            nickname: Set(nickname.to_string()),
            avatar: Set(avatar.map(str::to_string)),
            total_seconds: Set(0),
            last_seen_at: Set(now),
            created_at: Set(now),
        };
        let row = listener_db::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(listener_db::Column::Id)
                    .update_columns([listener_db::Column::Nickname, listener_db::Column::Avatar])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(map_db_error)?;
        Listener::try_from(row)
    }

    async fn reset_total(&self, id: &ListenerId) -> Result<bool, ListenerError> {
        let result = listener_db::Entity::update_many()
            .col_expr(listener_db::Column::TotalSeconds, Expr::value(0i64))
            .filter(listener_db::Column::Id.eq(id.to_string()))
            .exec(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected > 0)
    }
}
