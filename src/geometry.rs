/// 几何协作层边界
///
/// 网格加载、三角形求交原语由外部实现（IndoorScene trait 的实现方），
/// 本模块只定义边界接口和基础向量运算：
/// - Vec3: 三维向量 (米)
/// - RayHit: 批量求交结果（每条命中射线的最近交点）
/// - IndoorScene: 批量射线求交、表面材料/法向量查询、边界查询、采样网格生成

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 三维向量 (米)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// 创建新向量
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    /// 零向量
    pub fn zero() -> Self {
        Vec3 { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// 点积
    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// 向量长度
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// 归一化，长度退化时返回 None
    pub fn normalized(&self) -> Option<Vec3> {
        let n = self.norm();
        if n < 1e-12 {
            return None;
        }
        Some(Vec3::new(self.x / n, self.y / n, self.z / n))
    }

    /// 与另一点的欧几里得距离
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        (*other - *self).norm()
    }

    /// 与另一点的 2D (XY 平面) 距离
    pub fn distance_2d_to(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// 数乘
    pub fn scale(&self, s: f64) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }

    /// 关于单位法向量的镜面反射方向: d - 2(d·n)n
    pub fn reflect(&self, normal: &Vec3) -> Vec3 {
        let d = self.dot(normal);
        *self - normal.scale(2.0 * d)
    }

    /// 转换为数组形式
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// 从数组创建
    pub fn from_array(a: [f64; 3]) -> Self {
        Vec3::new(a[0], a[1], a[2])
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// 批量求交结果中的单个命中
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// 交点位置
    pub location: Vec3,
    /// 对应的输入射线下标
    pub ray_index: usize,
    /// 命中的表面下标（用于材料/法向量查询）
    pub surface_index: usize,
}

/// 室内场景接口 - 几何协作层
///
/// 实现方负责网格加载与射线-三角形求交；本 crate 仅通过该接口使用几何能力。
/// 要求 ray_intersect 对每条命中的射线只返回最近交点（M <= N）。
/// 本 crate 对实现方只做只读批量查询，不附加线程安全保证。
pub trait IndoorScene {
    /// 批量射线求交
    ///
    /// # 参数
    /// - `origins`: 射线起点，长度 N
    /// - `directions`: 射线方向（单位向量），长度 N
    ///
    /// # 返回
    /// 每条命中射线的最近交点列表（M <= N）
    fn ray_intersect(&self, origins: &[Vec3], directions: &[Vec3]) -> Result<Vec<RayHit>>;

    /// 查询表面材料名
    fn surface_material(&self, surface_index: usize) -> &str;

    /// 查询表面单位法向量
    fn surface_normal(&self, surface_index: usize) -> Vec3;

    /// 模型边界 (min, max)
    fn bounds(&self) -> (Vec3, Vec3);

    /// 生成 2D 采样网格（固定高度单层）
    ///
    /// 坐标均匀分布且总是包含两端边界点。
    fn generate_grid_2d(&self, spacing: f64, height: f64) -> Vec<Vec3> {
        let (min, max) = self.bounds();
        let xs = linspace_cover(min.x, max.x, spacing);
        let ys = linspace_cover(min.y, max.y, spacing);

        let mut points = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                points.push(Vec3::new(x, y, height));
            }
        }
        points
    }

    /// 生成 3D 采样网格（多层高度）
    ///
    /// Z 范围缺省时使用模型边界，Z 间距缺省时与 XY 间距相同。
    fn generate_grid_3d(
        &self,
        spacing: f64,
        z_min: Option<f64>,
        z_max: Option<f64>,
        z_spacing: Option<f64>,
    ) -> Vec<Vec3> {
        let (min, max) = self.bounds();
        let z_min = z_min.unwrap_or(min.z);
        let z_max = z_max.unwrap_or(max.z);
        let z_spacing = z_spacing.unwrap_or(spacing);

        let xs = linspace_cover(min.x, max.x, spacing);
        let ys = linspace_cover(min.y, max.y, spacing);
        let zs = linspace_cover(z_min, z_max, z_spacing);

        let mut points = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        for &z in &zs {
            for &y in &ys {
                for &x in &xs {
                    points.push(Vec3::new(x, y, z));
                }
            }
        }
        points
    }
}

/// 在 [min, max] 上均匀取点，间距不超过 spacing，两端点总是包含
fn linspace_cover(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    if max <= min {
        return vec![min];
    }
    let num = ((max - min) / spacing).ceil() as usize + 1;
    if num < 2 {
        return vec![min, max];
    }
    let step = (max - min) / (num - 1) as f64;
    (0..num).map(|i| min + step * i as f64).collect()
}
