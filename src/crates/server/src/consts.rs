pub const URL_PATH_API: &str = "/api";

/// 管理接口共享密钥请求头
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";
