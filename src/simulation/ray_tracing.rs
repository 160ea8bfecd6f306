/// 射线追踪器（基础版）
///
/// 基于几何光学的简化传播模型：
/// - 两点间一次遮挡检测，遮挡时按一次反射计损耗
/// - 向量化的多点/多接收机批量计算（一次批量求交调用）
/// - 确定性模型之上叠加一个零均值高斯阴影衰落样本

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::config::SimulationConfig;
use crate::error::{EmnavError, Result};
use crate::geometry::{IndoorScene, Vec3};
use crate::simulation::path_loss::PathLossModel;

/// 单条射线的最大追踪距离 (米)
pub const DEFAULT_MAX_TRACE_DISTANCE_M: f64 = 50.0;

/// 对数计算前的距离下限 (米)
pub const MIN_LOG_DISTANCE_M: f64 = 0.1;

/// 遮挡判定容差 (米) - 交点距离小于直线距离减去该容差视为遮挡
const OCCLUSION_TOLERANCE_M: f64 = 1e-3;

/// 射线 - 仅在单次仿真调用内存活
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// 起点
    pub origin: Vec3,
    /// 方向（单位向量）
    pub direction: Vec3,
    /// 当前功率 (dBm)
    pub power: f64,
    /// 累计传播距离 (米)
    pub distance: f64,
    /// 反射次数
    pub bounces: usize,
}

/// 单条射线的最近表面交点
#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit {
    /// 交点位置
    pub point: Vec3,
    /// 起点到交点的距离 (米)
    pub distance: f64,
    /// 命中的表面下标
    pub surface_index: usize,
}

/// 射线追踪器
pub struct RayTracer<'a> {
    pub(crate) scene: &'a dyn IndoorScene,
    pub(crate) config: SimulationConfig,
    pub(crate) path_loss: PathLossModel,
    rng: StdRng,
    fading: Normal<f64>,
}

impl<'a> RayTracer<'a> {
    /// 创建射线追踪器
    ///
    /// 配置非法时（负阴影衰落标准差等）返回配置错误。
    pub fn new(scene: &'a dyn IndoorScene, config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let fading = Normal::new(0.0, config.shadow_fading_std)
            .map_err(|e| EmnavError::Config(format!("阴影衰落参数非法: {}", e)))?;
        let path_loss = PathLossModel::from_config(&config);

        Ok(RayTracer {
            scene,
            config,
            path_loss,
            rng: StdRng::from_entropy(),
            fading,
        })
    }

    /// 当前仿真配置
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 路径损耗模型
    pub fn path_loss(&self) -> &PathLossModel {
        &self.path_loss
    }

    /// 追踪单条射线，返回 max_distance 内的最近交点
    pub fn trace_ray(&self, ray: &Ray, max_distance: f64) -> Result<Option<SurfaceHit>> {
        let hits = self
            .scene
            .ray_intersect(&[ray.origin], &[ray.direction])?;

        let nearest = hits
            .iter()
            .map(|h| SurfaceHit {
                point: h.location,
                distance: ray.origin.distance_to(&h.location),
                surface_index: h.surface_index,
            })
            .filter(|h| h.distance < max_distance)
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(nearest)
    }

    /// 模拟两点间的信号强度 (dBm)
    ///
    /// 无遮挡按 0 次反射计，有遮挡按 1 次反射计，最后叠加一个阴影衰落样本。
    pub fn simulate_signal(&mut self, tx: Vec3, rx: Vec3) -> Result<f64> {
        let distance = tx.distance_to(&rx);

        let direction = match (rx - tx).normalized() {
            Some(d) => d,
            // 收发重合的退化情形，不做求交
            None => return Ok(self.deterministic_power(distance, 0) + self.shadow_fading()),
        };

        let probe = Ray {
            origin: tx,
            direction,
            power: self.config.tx_power,
            distance: 0.0,
            bounces: 0,
        };
        let hit = self.trace_ray(&probe, DEFAULT_MAX_TRACE_DISTANCE_M)?;

        let blocked = matches!(hit, Some(h) if h.distance < distance);
        let reflections = if blocked { 1 } else { 0 };

        Ok(self.deterministic_power(distance, reflections) + self.shadow_fading())
    }

    /// 批量模拟信号强度（向量化）
    ///
    /// # 参数
    /// - `tx_positions`: 发射机位置，长度 M
    /// - `rx_positions`: 接收机/采样点位置，长度 N
    ///
    /// # 返回
    /// RSSI 矩阵 [N][M]，行对应采样点，列对应发射机
    ///
    /// 每个 (rx, tx) 对从 rx 向 tx 发射一条射线，所有射线一次批量求交，
    /// 按交点距离与直线距离比较（1 毫米容差）判定遮挡，
    /// 确定性模型与标量路径一致，衰落样本逐对独立。
    pub fn simulate_signal_batch(
        &mut self,
        tx_positions: &[Vec3],
        rx_positions: &[Vec3],
    ) -> Result<Vec<Vec<f64>>> {
        let num_rx = rx_positions.len();
        let num_tx = tx_positions.len();

        let mut origins = Vec::with_capacity(num_rx * num_tx);
        let mut directions = Vec::with_capacity(num_rx * num_tx);
        // 每条射线对应的 (rx 下标, tx 下标, 直线距离)
        let mut pairs = Vec::with_capacity(num_rx * num_tx);
        // 收发重合的退化对，跳过求交直接按零距离模型计算
        let mut degenerate = Vec::new();

        for (rx_idx, rx) in rx_positions.iter().enumerate() {
            for (tx_idx, tx) in tx_positions.iter().enumerate() {
                let delta = *tx - *rx;
                match delta.normalized() {
                    Some(direction) => {
                        origins.push(*rx);
                        directions.push(direction);
                        pairs.push((rx_idx, tx_idx, delta.norm()));
                    }
                    None => degenerate.push((rx_idx, tx_idx)),
                }
            }
        }

        let hits = self.scene.ray_intersect(&origins, &directions)?;

        let mut blocked = vec![false; pairs.len()];
        for hit in &hits {
            let hit_distance = hit.location.distance_to(&origins[hit.ray_index]);
            let direct_distance = pairs[hit.ray_index].2;
            if hit_distance < direct_distance - OCCLUSION_TOLERANCE_M {
                blocked[hit.ray_index] = true;
            }
        }

        let mut matrix = vec![vec![0.0; num_tx]; num_rx];
        for (i, &(rx_idx, tx_idx, distance)) in pairs.iter().enumerate() {
            let reflections = if blocked[i] { 1 } else { 0 };
            matrix[rx_idx][tx_idx] =
                self.deterministic_power(distance, reflections) + self.shadow_fading();
        }
        for &(rx_idx, tx_idx) in &degenerate {
            matrix[rx_idx][tx_idx] = self.deterministic_power(0.0, 0) + self.shadow_fading();
        }

        Ok(matrix)
    }

    /// 确定性接收功率，距离先按下限 0.1 米钳制
    pub(crate) fn deterministic_power(&self, distance: f64, reflections: usize) -> f64 {
        self.path_loss
            .received_power(distance.max(MIN_LOG_DISTANCE_M), reflections)
    }

    /// 采样一个零均值高斯阴影衰落值 (dB)
    pub(crate) fn shadow_fading(&mut self) -> f64 {
        self.fading.sample(&mut self.rng)
    }
}
