use crate::{consts, error::ApiError, AppState};
use actix_cors::Cors;
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, ResponseError,
};
use log::warn;

/// 上报接口会被不同域名下的前端页面调用
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "HEAD", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

/// 校验 `X-Admin-Key` 请求头，未配置密钥时所有管理接口均不可用
pub fn check_admin_key(configured: &str, provided: Option<&str>) -> Result<(), ApiError> {
    if configured.is_empty() {
        return Err(ApiError::Unauthorized("admin routes are disabled".to_string()));
    }
    match provided {
        Some(key) if key == configured => Ok(()),
        Some(_) => Err(ApiError::Unauthorized("invalid admin key".to_string())),
        None => Err(ApiError::Unauthorized(format!(
            "missing {} header",
            consts::ADMIN_KEY_HEADER
        ))),
    }
}

pub async fn admin_authenticator(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, actix_web::Error> {
    let configured = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.app_cfg.admin_key())
        .unwrap_or_default();
    let provided = req
        .headers()
        .get(consts::ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = check_admin_key(&configured, provided) {
        warn!("admin request to {} rejected: {}", req.path(), e);
        let response = e.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }
    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configured_key_rejects_everything() {
        assert!(check_admin_key("", Some("")).is_err());
        assert!(check_admin_key("", None).is_err());
    }

    #[test]
    fn key_must_match_exactly() {
        assert!(check_admin_key("s3cret", Some("s3cret")).is_ok());
        assert!(check_admin_key("s3cret", Some("S3CRET")).is_err());
        assert!(check_admin_key("s3cret", None).is_err());
    }
}
