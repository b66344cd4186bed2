use crate::error::ApiError;
use crate::AppState;
use actix_web::{web, web::Query, HttpResponse};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FeedQuery {
    since: Option<String>,
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<u64>,
}

/// RFC 3339 时间转换为 UTC，不带时区的时间按 UTC 处理
pub fn parse_since(raw: &str) -> Result<NaiveDateTime, ApiError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ApiError::BadRequest(format!("invalid since timestamp: {}", raw)))
}

async fn milestones(
    state: web::Data<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<HttpResponse, ApiError> {
    let since = query.since.as_deref().map(parse_since).transpose()?;
    let entries = state.get_milestones.handle(since, query.limit).await?;
    Ok(HttpResponse::Ok().json(entries))
}

async fn leaderboard(
    state: web::Data<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<HttpResponse, ApiError> {
    let entries = state.get_leaderboard.handle(query.limit).await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub fn configure_service(svc: &mut web::ServiceConfig) {
    svc.route("/milestones", web::get().to(milestones))
        .route("/leaderboard", web::get().to(leaderboard));
}
