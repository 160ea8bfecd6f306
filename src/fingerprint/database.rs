/// 指纹库
///
/// 位置 -> 信号向量的持久化存储：
/// - 位置按 2 位小数量化为键，同一物理格点总是命中同一条目
/// - 每个量化格点恰好一条记录，后写覆盖先写
/// - 保存/加载完整映射、接收机列表和元数据，加载失败显式报错

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::geometry::Vec3;

/// 量化后的位置键（厘米整数三元组，等价于保留 2 位小数）
type PositionKey = [i64; 3];

/// 位置量化：各坐标四舍五入到 2 位小数
fn quantize(position: &Vec3) -> PositionKey {
    [
        (position.x * 100.0).round() as i64,
        (position.y * 100.0).round() as i64,
        (position.z * 100.0).round() as i64,
    ]
}

/// 量化键还原为位置
fn dequantize(key: &PositionKey) -> Vec3 {
    Vec3::new(
        key[0] as f64 / 100.0,
        key[1] as f64 / 100.0,
        key[2] as f64 / 100.0,
    )
}

/// 指纹库元数据
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// 创建时间（保存时写入）
    pub created_at: Option<DateTime<Utc>>,
    /// 指纹数量
    pub num_fingerprints: usize,
    /// AP 数量
    pub num_aps: usize,
}

/// 持久化文件格式
#[derive(Serialize, Deserialize)]
struct DatabaseFile {
    fingerprints: Vec<FingerprintRecord>,
    ap_positions: Vec<Vec3>,
    metadata: DatabaseMetadata,
}

#[derive(Serialize, Deserialize)]
struct FingerprintRecord {
    position: [f64; 3],
    rssi: Vec<f64>,
}

/// 指纹库
#[derive(Clone, Debug, Default)]
pub struct FingerprintDatabase {
    fingerprints: HashMap<PositionKey, Vec<f64>>,
    ap_positions: Vec<Vec3>,
    metadata: DatabaseMetadata,
}

impl FingerprintDatabase {
    /// 创建空指纹库
    pub fn new(ap_positions: Vec<Vec3>) -> Self {
        FingerprintDatabase {
            fingerprints: HashMap::new(),
            ap_positions,
            metadata: DatabaseMetadata::default(),
        }
    }

    /// 添加指纹，同一量化格点的旧值被覆盖
    pub fn add_fingerprint(&mut self, position: Vec3, rssi_values: Vec<f64>) {
        self.fingerprints.insert(quantize(&position), rssi_values);
    }

    /// 查询指定位置的指纹（量化键精确查找，不做邻域搜索）
    pub fn get_fingerprint(&self, position: Vec3) -> Option<&[f64]> {
        self.fingerprints
            .get(&quantize(&position))
            .map(|v| v.as_slice())
    }

    /// 获取所有指纹数据
    ///
    /// # 返回
    /// (positions, rssi_matrix)：两个数组下标稳定配对
    pub fn get_all_fingerprints(&self) -> (Vec<Vec3>, Vec<Vec<f64>>) {
        let mut positions = Vec::with_capacity(self.fingerprints.len());
        let mut rssi_values = Vec::with_capacity(self.fingerprints.len());

        for (key, rssi) in &self.fingerprints {
            positions.push(dequantize(key));
            rssi_values.push(rssi.clone());
        }

        (positions, rssi_values)
    }

    /// 指纹数量
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// AP (接收机) 位置列表，顺序固定
    pub fn ap_positions(&self) -> &[Vec3] {
        &self.ap_positions
    }

    /// AP 数量
    pub fn num_aps(&self) -> usize {
        self.ap_positions.len()
    }

    /// 元数据
    pub fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    /// 保存指纹库到文件
    ///
    /// 保存时写入元数据（创建时间、数量统计），父目录不存在时自动创建。
    pub fn save<P: AsRef<Path>>(&mut self, filepath: P) -> Result<()> {
        let filepath = filepath.as_ref();

        if let Some(parent) = filepath.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.metadata.created_at = Some(Utc::now());
        self.metadata.num_fingerprints = self.fingerprints.len();
        self.metadata.num_aps = self.ap_positions.len();

        let file = DatabaseFile {
            fingerprints: self
                .fingerprints
                .iter()
                .map(|(key, rssi)| FingerprintRecord {
                    position: dequantize(key).to_array(),
                    rssi: rssi.clone(),
                })
                .collect(),
            ap_positions: self.ap_positions.clone(),
            metadata: self.metadata.clone(),
        };

        let bytes = serde_json::to_vec(&file)?;
        std::fs::write(filepath, bytes)?;

        info!(
            path = %filepath.display(),
            num_fingerprints = self.metadata.num_fingerprints,
            num_aps = self.metadata.num_aps,
            "指纹库已保存"
        );

        Ok(())
    }

    /// 从文件加载指纹库
    ///
    /// 文件缺失或内容损坏时返回显式错误，不回退为空库。
    pub fn load<P: AsRef<Path>>(filepath: P) -> Result<Self> {
        let filepath = filepath.as_ref();

        let bytes = std::fs::read(filepath)?;
        let file: DatabaseFile = serde_json::from_slice(&bytes)?;

        let mut db = FingerprintDatabase::new(file.ap_positions);
        db.metadata = file.metadata;
        for record in file.fingerprints {
            db.add_fingerprint(Vec3::from_array(record.position), record.rssi);
        }

        info!(
            path = %filepath.display(),
            num_fingerprints = db.len(),
            num_aps = db.num_aps(),
            "指纹库已加载"
        );

        Ok(db)
    }
}
