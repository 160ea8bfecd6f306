/// 系统配置定义
///
/// 对应三个组件的独立配置：
/// - SimulationConfig: 电磁仿真 / 射线追踪参数
/// - FingerprintConfig: 指纹库构建参数
/// - LocalizationConfig: 定位算法参数
///
/// 所有配置为显式不可变结构体，在构造组件时传入，组件不读取任何全局状态。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmnavError;
use crate::geometry::Vec3;

/// 每次反射的固定损耗 (dB) - 经验值，仅用于基础追踪器的简化模型
pub const REFLECTION_LOSS_PER_BOUNCE_DB: f64 = 5.0;

/// 吸收损耗权重 - 经验值，多径追踪中吸收损耗按此比例计入
pub const ABSORPTION_WEIGHT: f64 = 0.2;

/// 材料电磁属性 (相对介电常数, 电导率)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    /// 相对介电常数
    pub epsilon_r: f64,
    /// 电导率 (S/m)
    pub sigma: f64,
}

/// 电磁仿真配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 发射功率 (dBm)
    pub tx_power: f64,
    /// 工作频率 (Hz)
    pub tx_frequency: f64,
    /// 最大反射次数
    pub max_reflections: usize,
    /// 材料属性表: 材料名 -> (epsilon_r, sigma)
    pub materials: HashMap<String, MaterialParams>,
    /// 阴影衰落标准差 (dB)
    pub shadow_fading_std: f64,
    /// 是否启用多径追踪
    pub multipath_enabled: bool,
    /// 是否启用高精度单路径模式
    pub high_precision: bool,
    /// 多径追踪发射射线数量
    pub num_rays: usize,
    /// 接收点容差距离 (米)
    pub rx_tolerance: f64,
    /// 功率剪枝阈值 (dBm)
    pub power_threshold_dbm: f64,
    /// 每次反射的固定损耗 (dB)，基础模型使用
    pub reflection_loss_per_bounce_db: f64,
    /// 吸收损耗权重，多径模型使用
    pub absorption_weight: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let mut materials = HashMap::new();
        materials.insert("concrete".to_string(), MaterialParams { epsilon_r: 4.5, sigma: 0.02 });
        materials.insert("brick".to_string(), MaterialParams { epsilon_r: 4.0, sigma: 0.01 });
        materials.insert("wood".to_string(), MaterialParams { epsilon_r: 2.5, sigma: 0.001 });
        materials.insert("glass".to_string(), MaterialParams { epsilon_r: 6.0, sigma: 0.0001 });
        materials.insert("metal".to_string(), MaterialParams { epsilon_r: 1.0, sigma: 1e7 });

        SimulationConfig {
            tx_power: 20.0,
            tx_frequency: 2.4e9,
            max_reflections: 3,
            materials,
            shadow_fading_std: 4.0,
            multipath_enabled: false,
            high_precision: false,
            num_rays: 360,
            rx_tolerance: 0.3,
            power_threshold_dbm: -100.0,
            reflection_loss_per_bounce_db: REFLECTION_LOSS_PER_BOUNCE_DB,
            absorption_weight: ABSORPTION_WEIGHT,
        }
    }
}

impl SimulationConfig {
    /// 创建启用多径追踪的配置
    pub fn with_multipath(num_rays: usize, rx_tolerance: f64, power_threshold_dbm: f64) -> Self {
        SimulationConfig {
            multipath_enabled: true,
            num_rays,
            rx_tolerance,
            power_threshold_dbm,
            ..Default::default()
        }
    }

    /// 校验仿真配置
    pub fn validate(&self) -> Result<(), EmnavError> {
        if self.shadow_fading_std < 0.0 {
            return Err(EmnavError::Config(format!(
                "阴影衰落标准差不能为负: {}",
                self.shadow_fading_std
            )));
        }
        if self.tx_frequency <= 0.0 {
            return Err(EmnavError::Config(format!(
                "工作频率必须为正: {}",
                self.tx_frequency
            )));
        }
        if self.num_rays == 0 {
            return Err(EmnavError::Config("射线数量必须大于 0".to_string()));
        }
        Ok(())
    }
}

/// 指纹库构建配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// XY 平面网格间距 (米)
    pub grid_spacing: f64,
    /// 固定采样高度 (米) - 指定时生成 2D 单层网格
    pub height: Option<f64>,
    /// Z 方向最小值 (米) - 3D 模式，缺省时取模型边界
    pub z_min: Option<f64>,
    /// Z 方向最大值 (米) - 3D 模式，缺省时取模型边界
    pub z_max: Option<f64>,
    /// Z 方向网格间距 (米) - 3D 模式，缺省时与 XY 间距相同
    pub z_spacing: Option<f64>,
    /// AP (接收机) 位置列表，顺序固定，与信号向量下标一一对应
    pub ap_positions: Vec<Vec3>,
    /// 批量大小，None 表示按点数自动选择
    pub batch_size: Option<usize>,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        FingerprintConfig {
            grid_spacing: 1.0,
            height: Some(1.5),
            z_min: None,
            z_max: None,
            z_spacing: None,
            ap_positions: vec![
                Vec3::new(5.0, 5.0, 2.5),
                Vec3::new(15.0, 5.0, 2.5),
                Vec3::new(5.0, 15.0, 2.5),
                Vec3::new(15.0, 15.0, 2.5),
            ],
            batch_size: None,
        }
    }
}

/// 定位算法类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// K 近邻
    Knn,
    /// 加权 K 近邻
    Wknn,
    /// 概率定位（高斯模型）
    Probabilistic,
}

impl FromStr for Algorithm {
    type Err = EmnavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "knn" => Ok(Algorithm::Knn),
            "wknn" => Ok(Algorithm::Wknn),
            "probabilistic" => Ok(Algorithm::Probabilistic),
            other => Err(EmnavError::Config(format!("不支持的定位算法: {}", other))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Knn => write!(f, "knn"),
            Algorithm::Wknn => write!(f, "wknn"),
            Algorithm::Probabilistic => write!(f, "probabilistic"),
        }
    }
}

/// 信号空间距离度量
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// 欧几里得距离
    Euclidean,
    /// 曼哈顿距离
    Manhattan,
}

/// 定位算法配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// 定位算法
    pub algorithm: Algorithm,
    /// K 近邻数量，None 表示按参考点数量自动选择
    pub k_neighbors: Option<usize>,
    /// 距离度量
    pub distance_metric: DistanceMetric,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        LocalizationConfig {
            algorithm: Algorithm::Wknn,
            k_neighbors: None,
            distance_metric: DistanceMetric::Euclidean,
        }
    }
}
