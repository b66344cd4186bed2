use crate::error::AppError;

/// 通用ID生成器接口，所有需要生成唯一ID的服务都可以使用此接口
#[async_trait::async_trait]
pub trait IdGenerator: Send + Sync {
    /// 生成下一个唯一ID
    async fn next_id(&self) -> Result<i64, AppError>;
}
