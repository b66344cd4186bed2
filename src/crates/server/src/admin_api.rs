use crate::error::ApiError;
use crate::middleware::other;
use crate::AppState;
use actix_web::{middleware::from_fn, web, web::Path, HttpResponse};
use application::context::AppContext;

async fn reset(state: web::Data<AppState>, path: Path<String>) -> Result<HttpResponse, ApiError> {
    let reset = state
        .listener_service
        .reset_listening(&AppContext::new(), &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "reset": reset })))
}

pub fn configure_service(svc: &mut web::ServiceConfig) {
    svc.service(
        web::scope("/admin")
            .wrap(from_fn(move |req, next| other::admin_authenticator(req, next)))
            .route("/listeners/{id}/reset", web::post().to(reset)),
    );
}
