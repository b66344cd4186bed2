//! 基于 DashMap 的内存存储，未配置数据库时及测试中使用

pub mod listener;
pub mod milestone;
