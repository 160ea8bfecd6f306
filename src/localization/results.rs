/// 定位结果数据结构
///
/// 包含单次定位输出和批量精度评估报告

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Algorithm;
use crate::geometry::Vec3;

/// 单次定位结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocateResult {
    /// 估计位置
    pub position: Vec3,
    /// 定位置信度 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 使用的算法
    pub algorithm: Algorithm,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
}

impl LocateResult {
    /// 创建新的定位结果，置信度钳制到 [0, 1]
    pub fn new(position: Vec3, confidence: f64, algorithm: Algorithm) -> Self {
        LocateResult {
            position,
            confidence: confidence.clamp(0.0, 1.0),
            algorithm,
            timestamp: Utc::now(),
        }
    }

    /// 获取 2D 坐标
    pub fn xy(&self) -> (f64, f64) {
        (self.position.x, self.position.y)
    }

    /// 与真实位置的 3D 误差 (米)
    pub fn error_to(&self, truth: &Vec3) -> f64 {
        self.position.distance_to(truth)
    }
}

impl fmt::Display for LocateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {:.2}) [{}] {:.1}%",
            self.position.x,
            self.position.y,
            self.position.z,
            self.algorithm,
            self.confidence * 100.0
        )
    }
}

/// 经验 CDF 的阈值点数
const CDF_NUM_THRESHOLDS: usize = 100;

/// 批量精度评估报告
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// 逐样本 2D 误差 (米)
    pub errors_2d: Vec<f64>,
    /// 逐样本 3D 误差 (米)
    pub errors_3d: Vec<f64>,
    /// 平均误差（按 use_3d 选择 2D 或 3D）
    pub mean_error: f64,
    /// 中位误差
    pub median_error: f64,
    /// 误差标准差
    pub std_error: f64,
    /// 最大误差
    pub max_error: f64,
    /// 平均 2D 误差
    pub mean_error_2d: f64,
    /// 平均 3D 误差
    pub mean_error_3d: f64,
    /// 经验 CDF 阈值点（[0, max_error] 上 100 个均匀点）
    pub cdf_thresholds: Vec<f64>,
    /// 经验 CDF 取值（误差 <= 阈值的样本比例）
    pub cdf_values: Vec<f64>,
}

impl AccuracyReport {
    /// 从逐样本误差计算统计报告
    ///
    /// 两个误差数组长度必须一致且非空。
    pub fn from_errors(errors_2d: Vec<f64>, errors_3d: Vec<f64>, use_3d: bool) -> Self {
        let errors = if use_3d { &errors_3d } else { &errors_2d };
        let n = errors.len() as f64;

        let mean_error = errors.iter().sum::<f64>() / n;
        let max_error = errors.iter().copied().fold(0.0, f64::max);

        let mut sorted = errors.clone();
        sorted.sort_by(f64::total_cmp);
        let median_error = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };

        let variance = errors.iter().map(|e| (e - mean_error).powi(2)).sum::<f64>() / n;
        let std_error = variance.sqrt();

        // 先算比值使最后一个阈值恰好等于 max_error
        let cdf_thresholds: Vec<f64> = (0..CDF_NUM_THRESHOLDS)
            .map(|i| max_error * (i as f64 / (CDF_NUM_THRESHOLDS - 1) as f64))
            .collect();
        let cdf_values: Vec<f64> = cdf_thresholds
            .iter()
            .map(|&t| errors.iter().filter(|&&e| e <= t).count() as f64 / n)
            .collect();

        let mean_error_2d = errors_2d.iter().sum::<f64>() / errors_2d.len() as f64;
        let mean_error_3d = errors_3d.iter().sum::<f64>() / errors_3d.len() as f64;

        AccuracyReport {
            errors_2d,
            errors_3d,
            mean_error,
            median_error,
            std_error,
            max_error,
            mean_error_2d,
            mean_error_3d,
            cdf_thresholds,
            cdf_values,
        }
    }

    /// 评估摘要描述
    pub fn summary(&self) -> String {
        format!(
            "平均误差(2D): {:.2} m, 平均误差(3D): {:.2} m, 中位误差: {:.2} m, 标准差: {:.2} m, 最大误差: {:.2} m",
            self.mean_error_2d, self.mean_error_3d, self.median_error, self.std_error, self.max_error
        )
    }
}
