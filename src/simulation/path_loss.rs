/// 路径损耗模型
///
/// 纯函数物理计算，无内部状态（除构造时固定的频率/发射功率/材料表）：
/// - 自由空间损耗 (Friis 公式)
/// - 材料反射损耗（简化反射系数模型，非全场计算）
/// - 单段路径接收功率（固定每次反射损耗的简化模型）

use std::collections::HashMap;

use crate::config::{MaterialParams, SimulationConfig};

/// 光速 (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// 反射系数未知材料的缺省值
const DEFAULT_REFLECTION_COEFFICIENT: f64 = 0.3;

/// 吸收损耗未知材料的缺省值 (dB)
const DEFAULT_ABSORPTION_LOSS_DB: f64 = 10.0;

/// 有效反射系数非正时的固定惩罚 (dB)，避免对数未定义
const GRAZING_REFLECTION_LOSS_DB: f64 = 20.0;

/// 材料属性表
///
/// 持有配置中的 (epsilon_r, sigma) 参数，提供简化的
/// 反射系数与吸收损耗查询。未知材料使用缺省值。
#[derive(Clone, Debug)]
pub struct MaterialTable {
    params: HashMap<String, MaterialParams>,
}

impl MaterialTable {
    /// 从配置材料表创建
    pub fn new(params: HashMap<String, MaterialParams>) -> Self {
        MaterialTable { params }
    }

    /// 查询材料参数
    pub fn params(&self, material: &str) -> Option<&MaterialParams> {
        self.params.get(material)
    }

    /// 简化反射系数查询（固定经验表）
    pub fn reflection_coefficient(&self, material: &str) -> f64 {
        match material {
            "concrete" => 0.3,
            "brick" => 0.4,
            "wood" => 0.5,
            "glass" => 0.7,
            "metal" => 0.9,
            _ => DEFAULT_REFLECTION_COEFFICIENT,
        }
    }

    /// 简化吸收损耗查询 (dB，固定经验表)
    pub fn absorption_loss_db(&self, material: &str) -> f64 {
        match material {
            "concrete" => 10.0,
            "brick" => 8.0,
            "wood" => 5.0,
            "glass" => 3.0,
            "metal" => 1.0,
            _ => DEFAULT_ABSORPTION_LOSS_DB,
        }
    }
}

/// 路径损耗模型
#[derive(Clone, Debug)]
pub struct PathLossModel {
    /// 工作频率 (Hz)
    pub frequency: f64,
    /// 发射功率 (dBm)
    pub tx_power: f64,
    /// 波长 (米)
    pub wavelength: f64,
    /// 每次反射的固定损耗 (dB)
    pub reflection_loss_per_bounce_db: f64,
    /// 材料属性表
    pub materials: MaterialTable,
}

impl PathLossModel {
    /// 从仿真配置创建
    pub fn from_config(config: &SimulationConfig) -> Self {
        PathLossModel {
            frequency: config.tx_frequency,
            tx_power: config.tx_power,
            wavelength: SPEED_OF_LIGHT / config.tx_frequency,
            reflection_loss_per_bounce_db: config.reflection_loss_per_bounce_db,
            materials: MaterialTable::new(config.materials.clone()),
        }
    }

    /// 自由空间路径损耗 (Friis 公式)
    ///
    /// FSPL = 20*log10(d) + 20*log10(f) - 147.55
    ///
    /// 距离小于 1e-6 米视为自身退化情形，返回 0 dB。
    pub fn free_space_loss(&self, distance: f64) -> f64 {
        if distance < 1e-6 {
            return 0.0;
        }
        20.0 * distance.log10() + 20.0 * self.frequency.log10() - 147.55
    }

    /// 反射损耗 (dB)
    ///
    /// 有效反射系数 = 材料反射系数 * cos(入射角)。
    /// 有效系数非正时返回固定 20 dB 惩罚。
    pub fn reflection_loss(&self, material: &str, incidence_angle: f64) -> f64 {
        let coeff = self.materials.reflection_coefficient(material);
        let effective = coeff * incidence_angle.cos();

        if effective <= 0.0 {
            GRAZING_REFLECTION_LOSS_DB
        } else {
            -20.0 * effective.log10()
        }
    }

    /// 单段路径接收功率 (dBm)
    ///
    /// rx = tx_power - FSPL(d) - n * 每次反射固定损耗
    pub fn received_power(&self, distance: f64, reflection_count: usize) -> f64 {
        let fspl = self.free_space_loss(distance);
        let reflection_loss = reflection_count as f64 * self.reflection_loss_per_bounce_db;
        self.tx_power - fspl - reflection_loss
    }
}
