/// 多径传播追踪器
///
/// 扩展基础射线追踪器，实现真实的多径传播模拟：
/// 从发射机发出的所有射线中找出能到达接收点的全部几何有效路径，
/// 并在线性功率域叠加（非相干功率相加，不建模相位/干涉）。

use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::geometry::{IndoorScene, Vec3};
use crate::simulation::ray_tracing::{Ray, RayTracer};

/// 多径模式下单段射线的最大追踪距离 (米)
const MULTIPATH_MAX_TRACE_DISTANCE_M: f64 = 100.0;

/// 反射后新射线沿反射方向的偏移量 (米)，避免立即自交
const REFLECTION_OFFSET_M: f64 = 1e-3;

/// 未命中时允许直接射向接收点的方向对齐下限 (cos 30°)
const LONG_RANGE_ALIGNMENT: f64 = 0.866;

/// 终止判定的方向对齐下限
const TERMINAL_ALIGNMENT: f64 = 0.5;

/// dB 值转线性值
pub fn db_to_linear(db_value: f64) -> f64 {
    10f64.powf(db_value / 10.0)
}

/// 线性值转 dB 值，非正输入返回负无穷
pub fn linear_to_db(linear_value: f64) -> f64 {
    if linear_value <= 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * linear_value.log10()
}

/// 一条完整的反射路径 - 仅在单次仿真调用内存活
#[derive(Clone, Debug)]
pub struct ReflectionPath {
    /// 有序路径点（起点、各反射点、终点）
    pub path_points: Vec<Vec3>,
    /// 各反射点的材料名，与反射点顺序一致
    pub materials: Vec<String>,
    /// 累计传播距离 (米)
    pub total_distance: f64,
    /// 累计损耗 (dB)
    pub total_loss: f64,
}

impl ReflectionPath {
    /// 反射次数
    pub fn num_bounces(&self) -> usize {
        self.materials.len()
    }
}

/// 深度优先搜索的分支状态
struct TraceFrame {
    ray: Ray,
    path_points: Vec<Vec3>,
    materials: Vec<String>,
    total_distance: f64,
    total_loss: f64,
}

/// 多径射线追踪器
pub struct MultipathRayTracer<'a> {
    base: RayTracer<'a>,
}

impl<'a> MultipathRayTracer<'a> {
    /// 创建多径射线追踪器
    pub fn new(scene: &'a dyn IndoorScene, config: SimulationConfig) -> Result<Self> {
        let base = RayTracer::new(scene, config)?;

        let config = base.config();
        if config.multipath_enabled {
            info!(
                num_rays = config.num_rays,
                rx_tolerance = config.rx_tolerance,
                power_threshold_dbm = config.power_threshold_dbm,
                "多径追踪已启用"
            );
        }

        Ok(MultipathRayTracer { base })
    }

    /// 基础追踪器
    pub fn base(&self) -> &RayTracer<'a> {
        &self.base
    }

    /// 多径传播追踪：发射 num_rays 条射线，收集所有能到达接收点的路径
    pub fn trace_all_paths(&self, tx: Vec3, rx: Vec3) -> Result<Vec<ReflectionPath>> {
        let config = self.base.config();
        let directions = fibonacci_sphere_directions(config.num_rays);

        let mut valid_paths = Vec::new();
        for direction in directions {
            let ray = Ray {
                origin: tx,
                direction,
                power: config.tx_power,
                distance: 0.0,
                bounces: 0,
            };
            self.trace_single_ray(ray, rx, &mut valid_paths)?;
        }

        debug!(
            num_rays = config.num_rays,
            num_paths = valid_paths.len(),
            "多径追踪完成"
        );

        Ok(valid_paths)
    }

    /// 追踪单条射线的所有反射分支，收集到达接收点的路径
    ///
    /// 使用显式栈做迭代深度优先搜索，不做真正的递归；
    /// 功率低于阈值的分支剪枝。
    fn trace_single_ray(
        &self,
        initial: Ray,
        rx: Vec3,
        valid_paths: &mut Vec<ReflectionPath>,
    ) -> Result<()> {
        let config = self.base.config();

        let mut stack = vec![TraceFrame {
            path_points: vec![initial.origin],
            materials: Vec::new(),
            total_distance: 0.0,
            total_loss: 0.0,
            ray: initial,
        }];

        while let Some(frame) = stack.pop() {
            let current_power = config.tx_power - frame.total_loss;
            if current_power < config.power_threshold_dbm {
                continue;
            }

            let to_rx = rx - frame.ray.origin;
            let distance_to_rx = to_rx.norm();

            if let Some(direction_to_rx) = to_rx.normalized() {
                let alignment = frame.ray.direction.dot(&direction_to_rx);

                // 到达接收点附近且方向大致正确，闭合路径
                if distance_to_rx <= config.rx_tolerance && alignment > TERMINAL_ALIGNMENT {
                    valid_paths.push(self.close_path(&frame, rx, distance_to_rx));
                    continue;
                }
            }

            if frame.ray.bounces >= config.max_reflections {
                continue;
            }

            let hit = self
                .base
                .trace_ray(&frame.ray, MULTIPATH_MAX_TRACE_DISTANCE_M)?;

            let Some(hit) = hit else {
                // 未命中任何表面：方向足够对齐时尝试一次远程直达
                if distance_to_rx < MULTIPATH_MAX_TRACE_DISTANCE_M {
                    if let Some(direction_to_rx) = to_rx.normalized() {
                        if frame.ray.direction.dot(&direction_to_rx) > LONG_RANGE_ALIGNMENT {
                            valid_paths.push(self.close_path(&frame, rx, distance_to_rx));
                        }
                    }
                }
                continue;
            };

            // 命中表面：累计损耗并镜面反射
            let material = self
                .base
                .scene
                .surface_material(hit.surface_index)
                .to_string();
            let normal = self.base.scene.surface_normal(hit.surface_index);

            let cos_incidence = frame.ray.direction.dot(&normal).abs().clamp(0.0, 1.0);
            let incidence_angle = cos_incidence.acos();
            let reflection_loss = self.base.path_loss.reflection_loss(&material, incidence_angle);
            let absorption_loss = self.base.path_loss.materials.absorption_loss_db(&material);
            let segment_fspl = self.base.path_loss.free_space_loss(hit.distance);

            let new_loss = frame.total_loss
                + segment_fspl
                + reflection_loss
                + absorption_loss * config.absorption_weight;
            let new_distance = frame.total_distance + hit.distance;

            let reflected = frame.ray.direction.reflect(&normal);

            let mut path_points = frame.path_points;
            path_points.push(hit.point);
            let mut materials = frame.materials;
            materials.push(material);

            stack.push(TraceFrame {
                ray: Ray {
                    origin: hit.point + reflected.scale(REFLECTION_OFFSET_M),
                    direction: reflected,
                    power: config.tx_power - new_loss,
                    distance: new_distance,
                    bounces: frame.ray.bounces + 1,
                },
                path_points,
                materials,
                total_distance: new_distance,
                total_loss: new_loss,
            });
        }

        Ok(())
    }

    /// 以一段自由空间直达段闭合路径
    fn close_path(&self, frame: &TraceFrame, rx: Vec3, distance_to_rx: f64) -> ReflectionPath {
        let mut path_points = frame.path_points.clone();
        path_points.push(rx);

        ReflectionPath {
            path_points,
            materials: frame.materials.clone(),
            total_distance: frame.total_distance + distance_to_rx,
            total_loss: frame.total_loss + self.base.path_loss.free_space_loss(distance_to_rx),
        }
    }

    /// 高精度单路径追踪：沿镜面反射行走，直到接收点可直达
    ///
    /// 反射次数用尽时以剩余直线段闭合（非直达近似）。
    pub fn trace_best_path(&self, tx: Vec3, rx: Vec3) -> Result<ReflectionPath> {
        let config = self.base.config();

        let mut path_points = vec![tx];
        let mut materials = Vec::new();
        let mut total_distance = 0.0;
        let mut total_loss = 0.0;
        let mut origin = tx;

        loop {
            let to_rx = rx - origin;
            let distance_to_rx = to_rx.norm();
            let Some(direction) = to_rx.normalized() else {
                break;
            };

            let probe = Ray {
                origin,
                direction,
                power: config.tx_power - total_loss,
                distance: total_distance,
                bounces: materials.len(),
            };
            let hit = self.base.trace_ray(&probe, MULTIPATH_MAX_TRACE_DISTANCE_M)?;

            let occluding = hit.filter(|h| h.distance < distance_to_rx);
            let Some(hit) = occluding else {
                // 接收点可直达，闭合路径
                path_points.push(rx);
                total_distance += distance_to_rx;
                total_loss += self.base.path_loss.free_space_loss(distance_to_rx);
                return Ok(ReflectionPath {
                    path_points,
                    materials,
                    total_distance,
                    total_loss,
                });
            };

            // 反射次数用尽且仍被遮挡，退出循环走非直达近似
            if materials.len() >= config.max_reflections {
                break;
            }

            let material = self
                .base
                .scene
                .surface_material(hit.surface_index)
                .to_string();
            let normal = self.base.scene.surface_normal(hit.surface_index);

            let cos_incidence = direction.dot(&normal).abs().clamp(0.0, 1.0);
            let incidence_angle = cos_incidence.acos();
            total_loss += self.base.path_loss.free_space_loss(hit.distance)
                + self.base.path_loss.reflection_loss(&material, incidence_angle)
                + self.base.path_loss.materials.absorption_loss_db(&material)
                    * config.absorption_weight;
            total_distance += hit.distance;

            let reflected = direction.reflect(&normal);
            origin = hit.point + reflected.scale(REFLECTION_OFFSET_M);
            path_points.push(hit.point);
            materials.push(material);
        }

        // 反射次数用尽，以剩余直线段闭合
        let remaining = origin.distance_to(&rx);
        path_points.push(rx);
        Ok(ReflectionPath {
            path_points,
            materials,
            total_distance: total_distance + remaining,
            total_loss: total_loss + self.base.path_loss.free_space_loss(remaining),
        })
    }

    /// 多条路径的功率叠加（线性功率相加，非 dB 相加）
    ///
    /// 空路径列表返回负无穷（无信号）。
    pub fn combine_multipath_power(&self, paths: &[ReflectionPath]) -> f64 {
        if paths.is_empty() {
            return f64::NEG_INFINITY;
        }

        let tx_power = self.base.config().tx_power;
        let total_linear: f64 = paths
            .iter()
            .map(|path| db_to_linear(tx_power - path.total_loss))
            .sum();

        linear_to_db(total_linear)
    }

    /// 模拟两点间的信号强度 (dBm)
    ///
    /// 模式分派：多径叠加 > 高精度单路径 > 基础简化模型。
    /// 每种模式最后都恰好叠加一个阴影衰落样本。
    pub fn simulate_signal(&mut self, tx: Vec3, rx: Vec3) -> Result<f64> {
        let config = self.base.config();

        if config.multipath_enabled {
            let paths = self.trace_all_paths(tx, rx)?;
            let rx_power = self.combine_multipath_power(&paths);
            Ok(rx_power + self.base.shadow_fading())
        } else if config.high_precision {
            let path = self.trace_best_path(tx, rx)?;
            let rx_power = self.base.config().tx_power - path.total_loss;
            Ok(rx_power + self.base.shadow_fading())
        } else {
            self.base.simulate_signal(tx, rx)
        }
    }

    /// 批量模拟信号强度，使用基础追踪器的向量化快速模型
    pub fn simulate_signal_batch(
        &mut self,
        tx_positions: &[Vec3],
        rx_positions: &[Vec3],
    ) -> Result<Vec<Vec<f64>>> {
        self.base.simulate_signal_batch(tx_positions, rx_positions)
    }
}

/// Fibonacci 球面采样：生成 num_rays 个准均匀分布的单位方向
///
/// theta = 2*pi*i / 黄金比, phi = acos(1 - 2*(i+0.5)/n)
pub fn fibonacci_sphere_directions(num_rays: usize) -> Vec<Vec3> {
    let golden_ratio = (1.0 + 5f64.sqrt()) / 2.0;

    (0..num_rays)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / golden_ratio;
            let phi = (1.0 - 2.0 * (i as f64 + 0.5) / num_rays as f64).acos();

            Vec3::new(
                theta.cos() * phi.sin(),
                theta.sin() * phi.sin(),
                phi.cos(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_conversions() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
        assert!((db_to_linear(10.0) - 10.0).abs() < 1e-12);
        assert!((linear_to_db(100.0) - 20.0).abs() < 1e-12);
        assert_eq!(linear_to_db(0.0), f64::NEG_INFINITY);
        assert_eq!(linear_to_db(-1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_fibonacci_directions_are_unit_vectors() {
        let dirs = fibonacci_sphere_directions(128);
        assert_eq!(dirs.len(), 128);
        for d in &dirs {
            assert!((d.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_fibonacci_directions_cover_both_hemispheres() {
        let dirs = fibonacci_sphere_directions(200);
        let up = dirs.iter().filter(|d| d.z > 0.0).count();
        let down = dirs.iter().filter(|d| d.z < 0.0).count();
        assert_eq!(up, 100);
        assert_eq!(down, 100);
    }
}
