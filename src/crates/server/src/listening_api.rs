use crate::error::ApiError;
use crate::AppState;
use actix_web::{web, HttpResponse, Scope};
use application::command::listening::{ReportListeningCmd, ReportOutcome};
use application::context::AppContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    #[serde(default)]
    listener_id: String,
    seconds: Option<i64>,
    report_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    accepted: bool,
    total_seconds: i64,
    duplicate: bool,
    milestones: Vec<i64>,
}

impl From<ReportOutcome> for ReportResponse {
    fn from(outcome: ReportOutcome) -> Self {
        Self {
            accepted: outcome.accepted,
            total_seconds: outcome.total_seconds,
            duplicate: outcome.duplicate,
            milestones: outcome.milestones,
        }
    }
}

/// 页面关闭时的 beacon 以 `text/plain` 发送，因此不论 Content-Type 都按 JSON 解析原始字节
fn parse_report(body: &[u8]) -> Result<ReportListeningCmd, ApiError> {
    let body: ReportBody = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed report body: {}", e)))?;
    Ok(ReportListeningCmd {
        listener_id: body.listener_id,
        seconds: body.seconds,
        report_id: body.report_id,
    })
}

async fn report(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let cmd = parse_report(&body)?;
    let outcome = state
        .listening_service
        .report_listening(&AppContext::new(), cmd)
        .await?;
    Ok(HttpResponse::Ok().json(ReportResponse::from(outcome)))
}

pub fn scope() -> Scope {
    web::scope("/listening").route("/report", web::post().to(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_body_accepts_optional_token() {
        let cmd = parse_report(br#"{"listenerId":"abc","seconds":42}"#).unwrap();
        assert_eq!(cmd.listener_id, "abc");
        assert_eq!(cmd.seconds, Some(42));
        assert!(cmd.report_id.is_none());

        let cmd =
            parse_report(br#"{"listenerId":"abc","seconds":42,"reportId":"r-1"}"#).unwrap();
        assert_eq!(cmd.report_id.as_deref(), Some("r-1"));
    }

    #[test]
    fn non_integer_seconds_is_bad_request() {
        assert!(matches!(
            parse_report(br#"{"listenerId":"abc","seconds":1.5}"#),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_report(br#"{"listenerId":"abc","seconds":"10"}"#),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(parse_report(b"not json"), Err(ApiError::BadRequest(_))));
    }
}
