/// 指纹库构建器
///
/// 驱动采样网格生成与批量射线追踪来填充指纹库：
/// - 2D（固定高度单层）或 3D（多层高度）采样网格
/// - 按点数分档自动选择批量大小，批量计算限制内存并支持进度回调
/// - 任一批次失败则整个构建中止，不产生部分结果

use tracing::info;

use crate::config::FingerprintConfig;
use crate::error::{EmnavError, Result};
use crate::fingerprint::database::FingerprintDatabase;
use crate::geometry::{IndoorScene, Vec3};
use crate::simulation::multipath::MultipathRayTracer;

/// 构建进度
#[derive(Clone, Copy, Debug)]
pub struct BuildProgress {
    /// 已完成的采样点数
    pub done: usize,
    /// 采样点总数
    pub total: usize,
    /// 完成百分比 (0 ~ 100)
    pub percent: f64,
}

/// 按总点数分档自动选择批量大小
fn auto_batch_size(total_points: usize) -> usize {
    if total_points <= 100 {
        total_points.max(1)
    } else if total_points <= 1000 {
        50
    } else if total_points <= 10_000 {
        100
    } else {
        200
    }
}

/// 指纹库构建器
pub struct FingerprintBuilder<'t, 's> {
    scene: &'s dyn IndoorScene,
    tracer: &'t mut MultipathRayTracer<'s>,
    config: FingerprintConfig,
}

impl<'t, 's> FingerprintBuilder<'t, 's> {
    /// 创建构建器
    ///
    /// 接收机列表为空是配置错误。
    pub fn new(
        scene: &'s dyn IndoorScene,
        tracer: &'t mut MultipathRayTracer<'s>,
        config: FingerprintConfig,
    ) -> Result<Self> {
        if config.ap_positions.is_empty() {
            return Err(EmnavError::Config("AP 位置列表不能为空".to_string()));
        }
        if config.grid_spacing <= 0.0 {
            return Err(EmnavError::Config(format!(
                "网格间距必须为正: {}",
                config.grid_spacing
            )));
        }

        Ok(FingerprintBuilder { scene, tracer, config })
    }

    /// 构建指纹库
    pub fn build(&mut self) -> Result<FingerprintDatabase> {
        self.build_with_progress(|_| {})
    }

    /// 构建指纹库，每批结束后回调进度
    pub fn build_with_progress<F>(&mut self, mut progress_callback: F) -> Result<FingerprintDatabase>
    where
        F: FnMut(&BuildProgress),
    {
        let sampling_points = self.generate_sampling_points();
        let total_points = sampling_points.len();

        let batch_size = self.config.batch_size.unwrap_or_else(|| auto_batch_size(total_points));

        info!(
            mode = if self.config.height.is_some() { "2D" } else { "3D" },
            total_points,
            batch_size,
            num_aps = self.config.ap_positions.len(),
            "开始构建指纹库"
        );

        let mut database = FingerprintDatabase::new(self.config.ap_positions.clone());
        let ap_positions = self.config.ap_positions.clone();

        let mut done = 0;
        for batch_points in sampling_points.chunks(batch_size.max(1)) {
            let rssi_matrix = self
                .tracer
                .simulate_signal_batch(&ap_positions, batch_points)?;

            for (rx_pos, rssi_row) in batch_points.iter().zip(rssi_matrix) {
                database.add_fingerprint(*rx_pos, rssi_row);
            }

            done += batch_points.len();
            progress_callback(&BuildProgress {
                done,
                total: total_points,
                percent: done as f64 / total_points as f64 * 100.0,
            });
        }

        info!(num_fingerprints = database.len(), "指纹库构建完成");

        Ok(database)
    }

    /// 按配置生成采样网格点
    fn generate_sampling_points(&self) -> Vec<Vec3> {
        match self.config.height {
            Some(height) => self
                .scene
                .generate_grid_2d(self.config.grid_spacing, height),
            None => self.scene.generate_grid_3d(
                self.config.grid_spacing,
                self.config.z_min,
                self.config.z_max,
                self.config.z_spacing,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_batch_size_tiers() {
        assert_eq!(auto_batch_size(40), 40);
        assert_eq!(auto_batch_size(100), 100);
        assert_eq!(auto_batch_size(500), 50);
        assert_eq!(auto_batch_size(5000), 100);
        assert_eq!(auto_batch_size(50_000), 200);
    }
}
