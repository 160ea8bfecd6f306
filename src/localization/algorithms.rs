/// 指纹匹配定位算法
///
/// 在信号空间中将实测 RSSI 向量与指纹库比对，估计发射机位置：
/// - KNN: K 近邻质心
/// - WKNN: 距离倒数加权 K 近邻
/// - Probabilistic: 高斯观测模型的最大后验估计

use tracing::info;

use crate::config::{Algorithm, DistanceMetric, LocalizationConfig};
use crate::error::{EmnavError, Result};
use crate::fingerprint::database::FingerprintDatabase;
use crate::geometry::Vec3;
use crate::localization::results::{AccuracyReport, LocateResult};

/// 加权时距离的下限，避免除零
const MIN_SIGNAL_DISTANCE: f64 = 1e-6;

/// 概率模型中各接收机 RSSI 标准差的下限 (dBm)
const MIN_RSSI_STD_DBM: f64 = 1.0;

/// 按参考点数量自动选择 K 值
///
/// 取 round(sqrt(N)) 并钳制到 [8, 20]，再不超过参考点总数。
pub fn default_k(num_reference_points: usize) -> usize {
    let k = (num_reference_points as f64).sqrt().round() as usize;
    k.clamp(8, 20).min(num_reference_points.max(1))
}

/// 信号空间距离
fn signal_distance(a: &[f64], b: &[f64], metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
    }
}

/// 按信号距离升序取前 K 个参考点，返回 (下标, 距离)
fn k_nearest(
    reference_rssi: &[Vec<f64>],
    measured: &[f64],
    k: usize,
    metric: DistanceMetric,
) -> Vec<(usize, f64)> {
    let mut distances: Vec<(usize, f64)> = reference_rssi
        .iter()
        .enumerate()
        .map(|(i, reference)| (i, signal_distance(reference, measured, metric)))
        .collect();
    distances.sort_by(|a, b| a.1.total_cmp(&b.1));
    distances.truncate(k);
    distances
}

/// 定位算法统一接口
///
/// 输入实测信号向量，输出 (估计位置, 置信度)。
trait Locator {
    fn localize(&self, measured: &[f64]) -> (Vec3, f64);
}

/// K 近邻定位：K 个最近参考点位置的算术平均
struct KnnLocator {
    reference_positions: Vec<Vec3>,
    reference_rssi: Vec<Vec<f64>>,
    k: usize,
    metric: DistanceMetric,
}

impl Locator for KnnLocator {
    fn localize(&self, measured: &[f64]) -> (Vec3, f64) {
        let neighbors = k_nearest(&self.reference_rssi, measured, self.k, self.metric);

        let mut estimate = Vec3::zero();
        let mut distance_sum = 0.0;
        for &(index, distance) in &neighbors {
            estimate = estimate + self.reference_positions[index];
            distance_sum += distance;
        }
        let count = neighbors.len() as f64;
        estimate = estimate.scale(1.0 / count);

        let mean_distance = distance_sum / count;
        (estimate, 1.0 / (1.0 + mean_distance))
    }
}

/// 加权 K 近邻定位：权重为信号距离的倒数
struct WknnLocator {
    reference_positions: Vec<Vec3>,
    reference_rssi: Vec<Vec<f64>>,
    k: usize,
    metric: DistanceMetric,
}

impl Locator for WknnLocator {
    fn localize(&self, measured: &[f64]) -> (Vec3, f64) {
        let neighbors = k_nearest(&self.reference_rssi, measured, self.k, self.metric);

        let weights: Vec<f64> = neighbors
            .iter()
            .map(|&(_, distance)| 1.0 / distance.max(MIN_SIGNAL_DISTANCE))
            .collect();
        let weight_sum: f64 = weights.iter().sum();

        let mut estimate = Vec3::zero();
        for (&(index, _), &weight) in neighbors.iter().zip(&weights) {
            estimate = estimate + self.reference_positions[index].scale(weight / weight_sum);
        }

        let mean_distance =
            neighbors.iter().map(|&(_, d)| d).sum::<f64>() / neighbors.len() as f64;
        (estimate, 1.0 / (1.0 + mean_distance))
    }
}

/// 概率定位：逐接收机独立高斯观测模型，后验加权所有参考点
struct ProbabilisticLocator {
    reference_positions: Vec<Vec3>,
    reference_rssi: Vec<Vec<f64>>,
    /// 每个接收机在参考集上的 RSSI 标准差，下限 1 dBm
    rssi_std: Vec<f64>,
}

impl ProbabilisticLocator {
    fn new(reference_positions: Vec<Vec3>, reference_rssi: Vec<Vec<f64>>, num_aps: usize) -> Self {
        let n = reference_rssi.len() as f64;

        let mut rssi_std = Vec::with_capacity(num_aps);
        for ap_index in 0..num_aps {
            let mean = reference_rssi.iter().map(|row| row[ap_index]).sum::<f64>() / n;
            let variance = reference_rssi
                .iter()
                .map(|row| (row[ap_index] - mean).powi(2))
                .sum::<f64>()
                / n;
            rssi_std.push(variance.sqrt().max(MIN_RSSI_STD_DBM));
        }

        ProbabilisticLocator {
            reference_positions,
            reference_rssi,
            rssi_std,
        }
    }
}

impl Locator for ProbabilisticLocator {
    fn localize(&self, measured: &[f64]) -> (Vec3, f64) {
        // 对数似然: -0.5 * sum(((m - r) / std)^2)，常数项在归一化中消去
        let likelihoods: Vec<f64> = self
            .reference_rssi
            .iter()
            .map(|reference| {
                let exponent: f64 = measured
                    .iter()
                    .zip(reference)
                    .zip(&self.rssi_std)
                    .map(|((m, r), std)| ((m - r) / std).powi(2))
                    .sum();
                (-0.5 * exponent).exp()
            })
            .collect();

        let total: f64 = likelihoods.iter().sum();
        let n = likelihoods.len() as f64;

        // 所有似然下溢为零时退化为均匀后验
        let posteriors: Vec<f64> = if total > 0.0 && total.is_finite() {
            likelihoods.iter().map(|l| l / total).collect()
        } else {
            vec![1.0 / n; likelihoods.len()]
        };

        let mut estimate = Vec3::zero();
        for (position, &posterior) in self.reference_positions.iter().zip(&posteriors) {
            estimate = estimate + position.scale(posterior);
        }

        let confidence = posteriors.iter().copied().fold(0.0, f64::max);
        (estimate, confidence)
    }
}

/// 定位引擎
///
/// 从指纹库和配置构造，持有选定算法的匹配器。
pub struct LocalizationEngine {
    locator: Box<dyn Locator>,
    algorithm: Algorithm,
    num_aps: usize,
}

impl LocalizationEngine {
    /// 创建定位引擎
    ///
    /// 指纹库为空、或指纹向量长度与接收机数量不一致时返回配置错误。
    pub fn new(database: &FingerprintDatabase, config: &LocalizationConfig) -> Result<Self> {
        if database.is_empty() {
            return Err(EmnavError::Config("指纹库为空，无法定位".to_string()));
        }

        let (reference_positions, reference_rssi) = database.get_all_fingerprints();
        let num_aps = database.num_aps();

        for row in &reference_rssi {
            if row.len() != num_aps {
                return Err(EmnavError::Config(format!(
                    "指纹向量长度 {} 与接收机数量 {} 不一致",
                    row.len(),
                    num_aps
                )));
            }
        }

        let num_references = reference_positions.len();
        let k = config
            .k_neighbors
            .unwrap_or_else(|| default_k(num_references))
            .min(num_references)
            .max(1);

        let locator: Box<dyn Locator> = match config.algorithm {
            Algorithm::Knn => Box::new(KnnLocator {
                reference_positions,
                reference_rssi,
                k,
                metric: config.distance_metric,
            }),
            Algorithm::Wknn => Box::new(WknnLocator {
                reference_positions,
                reference_rssi,
                k,
                metric: config.distance_metric,
            }),
            Algorithm::Probabilistic => Box::new(ProbabilisticLocator::new(
                reference_positions,
                reference_rssi,
                num_aps,
            )),
        };

        info!(
            algorithm = %config.algorithm,
            num_references,
            num_aps,
            k,
            "定位引擎已创建"
        );

        Ok(LocalizationEngine {
            locator,
            algorithm: config.algorithm,
            num_aps,
        })
    }

    /// 定位一次
    ///
    /// 实测向量长度必须等于接收机数量。
    pub fn locate(&self, measured_rssi: &[f64]) -> Result<LocateResult> {
        if measured_rssi.len() != self.num_aps {
            return Err(EmnavError::Config(format!(
                "实测信号向量长度 {} 与接收机数量 {} 不一致",
                measured_rssi.len(),
                self.num_aps
            )));
        }

        let (position, confidence) = self.locator.localize(measured_rssi);
        Ok(LocateResult::new(position, confidence, self.algorithm))
    }

    /// 在带真值的测试集上批量评估定位精度
    pub fn evaluate_accuracy(
        &self,
        test_positions: &[Vec3],
        test_rssi: &[Vec<f64>],
        use_3d: bool,
    ) -> Result<AccuracyReport> {
        if test_positions.len() != test_rssi.len() {
            return Err(EmnavError::Config(format!(
                "测试位置数 {} 与测试信号数 {} 不一致",
                test_positions.len(),
                test_rssi.len()
            )));
        }
        if test_positions.is_empty() {
            return Err(EmnavError::Config("测试集不能为空".to_string()));
        }

        let mut errors_2d = Vec::with_capacity(test_positions.len());
        let mut errors_3d = Vec::with_capacity(test_positions.len());

        for (truth, rssi) in test_positions.iter().zip(test_rssi) {
            let result = self.locate(rssi)?;
            errors_2d.push(result.position.distance_2d_to(truth));
            errors_3d.push(result.position.distance_to(truth));
        }

        let report = AccuracyReport::from_errors(errors_2d, errors_3d, use_3d);

        info!(
            algorithm = %self.algorithm,
            num_samples = test_positions.len(),
            mean_error_2d = report.mean_error_2d,
            mean_error_3d = report.mean_error_3d,
            "精度评估完成"
        );

        Ok(report)
    }

    /// 使用的算法
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// 接收机数量
    pub fn num_aps(&self) -> usize {
        self.num_aps
    }
}
