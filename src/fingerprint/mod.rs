/// 指纹库模块
///
/// 该模块提供位置-信号强度指纹库的存储与构建，支持：
/// - 量化位置键的持久化指纹存储（保存/加载往返一致）
/// - 基于批量电磁仿真的指纹库构建与进度报告

pub mod builder;
pub mod database;

pub use builder::*;
pub use database::*;
