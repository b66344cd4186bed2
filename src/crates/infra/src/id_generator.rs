use application::command::shared::IdGenerator;
use application::error::AppError;
use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

const NODE_ID_BITS: i64 = 10;
const SEQUENCE_BITS: i64 = 12;
pub const MAX_NODE_ID: i64 = (1 << NODE_ID_BITS) - 1;
const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_SHIFT: i64 = NODE_ID_BITS + SEQUENCE_BITS;
const NODE_ID_SHIFT: i64 = SEQUENCE_BITS;
const EPOCH: i64 = 1735689600000; // 2025-01-01 00:00:00 UTC

/// 雪花算法ID生成器，用于里程碑事件的服务端ID
pub struct SnowflakeIdGenerator {
    node_id: i64,
    /// (上一个时间戳, 序列号)
    state: Mutex<(i64, i64)>,
}

impl SnowflakeIdGenerator {
    pub fn new(node_id: i64) -> Result<Self, AppError> {
        if !(0..=MAX_NODE_ID).contains(&node_id) {
            return Err(AppError::InvalidInput(format!(
                "node id must be within 0..={}, got {}",
                MAX_NODE_ID, node_id
            )));
        }
        Ok(Self {
            node_id,
            state: Mutex::new((0, 0)),
        })
    }

    fn now_millis() -> Result<i64, AppError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .map_err(|e| AppError::UnknownError(format!("system clock error: {}", e)))
    }

    fn compose(&self, timestamp: i64, sequence: i64) -> i64 {
        ((timestamp - EPOCH) << TIMESTAMP_SHIFT) | (self.node_id << NODE_ID_SHIFT) | sequence
    }
}

#[async_trait]
impl IdGenerator for SnowflakeIdGenerator {
    async fn next_id(&self) -> Result<i64, AppError> {
        let mut state = self.state.lock().await;
        let (last_timestamp, last_sequence) = *state;
        let mut timestamp = Self::now_millis()?;

        if timestamp < last_timestamp {
            return Err(AppError::UnknownError(
                "system clock moved backwards, refusing to generate id".to_string(),
            ));
        }

        let sequence = if timestamp == last_timestamp {
            let next = (last_sequence + 1) & MAX_SEQUENCE;
            if next == 0 {
                // 当前毫秒序列号耗尽，等待下一毫秒
                while timestamp <= last_timestamp {
                    tokio::time::sleep(tokio::time::Duration::from_micros(100)).await;
                    timestamp = Self::now_millis()?;
                }
            }
            next
        } else {
            0
        };

        *state = (timestamp, sequence);
        Ok(self.compose(timestamp, sequence))
    }
}
