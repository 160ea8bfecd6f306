/// 集成测试公共场景
///
/// 提供两个最小化的 IndoorScene 实现：
/// - EmptyScene: 无任何表面的空房间（纯自由空间）
/// - WallScene: 单面有限尺寸墙（x = wall_x 平面上的矩形）

use emnav::error::Result;
use emnav::geometry::{IndoorScene, RayHit, Vec3};

/// 无任何表面的空房间
pub struct EmptyScene {
    pub min: Vec3,
    pub max: Vec3,
}

impl EmptyScene {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        EmptyScene { min, max }
    }
}

impl IndoorScene for EmptyScene {
    fn ray_intersect(&self, _origins: &[Vec3], _directions: &[Vec3]) -> Result<Vec<RayHit>> {
        Ok(Vec::new())
    }

    fn surface_material(&self, _surface_index: usize) -> &str {
        "concrete"
    }

    fn surface_normal(&self, _surface_index: usize) -> Vec3 {
        Vec3::new(0.0, 0.0, 1.0)
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}

/// 单面墙场景：x = wall_x 平面上 y ∈ [y_min, y_max], z ∈ [z_min, z_max] 的矩形
///
/// 表面 0 为该墙，材料为 concrete，法向量 (1, 0, 0)。
pub struct WallScene {
    pub min: Vec3,
    pub max: Vec3,
    pub wall_x: f64,
    pub wall_y: (f64, f64),
    pub wall_z: (f64, f64),
}

impl WallScene {
    pub fn new(min: Vec3, max: Vec3, wall_x: f64, wall_y: (f64, f64), wall_z: (f64, f64)) -> Self {
        WallScene { min, max, wall_x, wall_y, wall_z }
    }
}

impl IndoorScene for WallScene {
    fn ray_intersect(&self, origins: &[Vec3], directions: &[Vec3]) -> Result<Vec<RayHit>> {
        let mut hits = Vec::new();

        for (ray_index, (origin, direction)) in origins.iter().zip(directions).enumerate() {
            if direction.x.abs() < 1e-12 {
                continue;
            }
            let t = (self.wall_x - origin.x) / direction.x;
            if t <= 1e-9 {
                continue;
            }
            let point = *origin + direction.scale(t);
            if point.y < self.wall_y.0
                || point.y > self.wall_y.1
                || point.z < self.wall_z.0
                || point.z > self.wall_z.1
            {
                continue;
            }
            hits.push(RayHit {
                location: point,
                ray_index,
                surface_index: 0,
            });
        }

        Ok(hits)
    }

    fn surface_material(&self, _surface_index: usize) -> &str {
        "concrete"
    }

    fn surface_normal(&self, _surface_index: usize) -> Vec3 {
        Vec3::new(1.0, 0.0, 0.0)
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}
