use crate::error::ApiError;
use crate::AppState;
use actix_web::{web, web::Json, web::Path, HttpResponse, Scope};
use application::command::listener::RegisterListenerCmd;
use application::context::AppContext;
use chrono::NaiveDateTime;
use domain::listener::Listener;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    listener_id: String,
    nickname: String,
    avatar: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListenerView {
    listener_id: String,
    nickname: String,
    avatar: Option<String>,
    total_seconds: i64,
    total_hours: i64,
    last_seen_at: NaiveDateTime,
    created_at: NaiveDateTime,
}

impl From<Listener> for ListenerView {
    fn from(listener: Listener) -> Self {
        Self {
            total_hours: listener.total_hours(),
            listener_id: listener.id.to_string(),
            nickname: listener.nickname,
            avatar: listener.avatar,
            total_seconds: listener.total_seconds,
            last_seen_at: listener.last_seen_at,
            created_at: listener.created_at,
        }
    }
}

async fn register(
    state: web::Data<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<HttpResponse, ApiError> {
    let listener = state
        .listener_service
        .register_listener(
            &AppContext::new(),
            RegisterListenerCmd {
                listener_id: body.listener_id,
                nickname: body.nickname,
                avatar: body.avatar,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(ListenerView::from(listener)))
}

async fn retrieve(state: web::Data<AppState>, path: Path<String>) -> Result<HttpResponse, ApiError> {
    let listener = state.get_listener.handle(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ListenerView::from(listener)))
}

async fn installed(state: web::Data<AppState>, path: Path<String>) -> Result<HttpResponse, ApiError> {
    let recorded = state
        .listener_service
        .record_app_installed(&AppContext::new(), &path.into_inner())
        .await?
        .is_some();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "recorded": recorded })))
}

pub fn scope() -> Scope {
    web::scope("/listeners")
        .route("", web::post().to(register))
        .route("/{id}", web::get().to(retrieve))
        .route("/{id}/installed", web::post().to(installed))
}
