/// 室内电磁指纹定位库
///
/// 基于射线追踪的电磁传播仿真合成位置指纹库，再用指纹匹配算法反推发射机位置：
/// - geometry: 三维向量与室内场景几何接口
/// - simulation: 路径损耗模型与基础/多径射线追踪
/// - fingerprint: 指纹库存储、持久化与批量构建
/// - localization: KNN / WKNN / 概率定位与精度评估

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod localization;
pub mod simulation;

pub use config::{
    Algorithm, DistanceMetric, FingerprintConfig, LocalizationConfig, SimulationConfig,
};
pub use error::{EmnavError, Result};
pub use fingerprint::{FingerprintBuilder, FingerprintDatabase};
pub use geometry::{IndoorScene, RayHit, Vec3};
pub use localization::{AccuracyReport, LocalizationEngine, LocateResult};
pub use simulation::{MultipathRayTracer, PathLossModel, RayTracer};
