/// 电磁传播仿真模块
///
/// 该模块提供基于几何光学的室内电磁传播仿真，支持：
/// - 自由空间/反射路径损耗物理模型
/// - 基础射线追踪（一次遮挡检测 + 固定每次反射损耗）
/// - 多径射线追踪（Fibonacci 球面采样 + 显式栈深度优先搜索 + 功率叠加）

pub mod multipath;
pub mod path_loss;
pub mod ray_tracing;

pub use multipath::*;
pub use path_loss::*;
pub use ray_tracing::*;
