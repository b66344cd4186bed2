use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 请求上下文，correlation id 用于串联同一次上报的日志
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub correlation_id: CorrelationId,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            correlation_id: CorrelationId::new(),
        }
    }
}
