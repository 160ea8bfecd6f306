/// 多径射线追踪器集成测试
///
/// 验证路径搜索、功率叠加、高精度单路径模式和模式分派；
/// 测试统一关闭阴影衰落 (std = 0) 以获得确定性结果

mod common;

#[cfg(test)]
mod tests {
    use crate::common::{EmptyScene, WallScene};
    use emnav::config::SimulationConfig;
    use emnav::geometry::Vec3;
    use emnav::simulation::multipath::{
        MultipathRayTracer, ReflectionPath, db_to_linear, linear_to_db,
    };

    fn multipath_config() -> SimulationConfig {
        SimulationConfig {
            multipath_enabled: true,
            num_rays: 720,
            rx_tolerance: 0.3,
            power_threshold_dbm: -120.0,
            shadow_fading_std: 0.0,
            ..Default::default()
        }
    }

    fn room() -> EmptyScene {
        EmptyScene::new(Vec3::zero(), Vec3::new(20.0, 20.0, 3.0))
    }

    /// 有限尺寸墙：x = 10 平面上 y ∈ [0, 10], z ∈ [0, 3]
    fn walled_room() -> WallScene {
        WallScene::new(
            Vec3::zero(),
            Vec3::new(20.0, 20.0, 3.0),
            10.0,
            (0.0, 10.0),
            (0.0, 3.0),
        )
    }

    #[test]
    fn test_open_space_finds_direct_paths() {
        let scene = room();
        let tracer = MultipathRayTracer::new(&scene, multipath_config()).unwrap();

        let tx = Vec3::new(5.0, 5.0, 1.5);
        let rx = Vec3::new(10.0, 5.0, 1.5);
        let paths = tracer.trace_all_paths(tx, rx).unwrap();

        assert!(!paths.is_empty(), "开阔空间应找到直达路径");
        for path in &paths {
            assert_eq!(path.num_bounces(), 0);
            assert_eq!(*path.path_points.last().unwrap(), rx);
            assert!(path.total_distance >= tx.distance_to(&rx) - 1e-9);
        }
    }

    #[test]
    fn test_wall_produces_reflected_paths() {
        let scene = walled_room();
        let tracer = MultipathRayTracer::new(&scene, multipath_config()).unwrap();

        // 收发同在墙的一侧，墙作为反射面提供至少一条反射路径
        let tx = Vec3::new(2.0, 5.0, 1.5);
        let rx = Vec3::new(6.0, 5.0, 1.5);
        let paths = tracer.trace_all_paths(tx, rx).unwrap();

        assert!(paths.iter().any(|p| p.num_bounces() >= 1));
        for path in paths.iter().filter(|p| p.num_bounces() >= 1) {
            assert_eq!(path.materials[0], "concrete");
            assert!(path.total_loss > 0.0);
        }
    }

    #[test]
    fn test_bounce_count_capped_by_config() {
        let scene = walled_room();
        let config = SimulationConfig {
            max_reflections: 2,
            ..multipath_config()
        };
        let tracer = MultipathRayTracer::new(&scene, config).unwrap();

        let paths = tracer
            .trace_all_paths(Vec3::new(2.0, 5.0, 1.5), Vec3::new(6.0, 5.0, 1.5))
            .unwrap();
        assert!(!paths.is_empty());
        for path in &paths {
            assert!(path.num_bounces() <= 2);
        }
    }

    #[test]
    fn test_combine_power_empty_is_silence() {
        let scene = room();
        let tracer = MultipathRayTracer::new(&scene, multipath_config()).unwrap();
        assert_eq!(tracer.combine_multipath_power(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_combine_power_adds_linearly() {
        let scene = room();
        let tracer = MultipathRayTracer::new(&scene, multipath_config()).unwrap();

        let path = ReflectionPath {
            path_points: vec![Vec3::zero(), Vec3::new(10.0, 0.0, 0.0)],
            materials: Vec::new(),
            total_distance: 10.0,
            total_loss: 60.0,
        };

        let single = tracer.combine_multipath_power(std::slice::from_ref(&path));
        let double = tracer.combine_multipath_power(&[path.clone(), path]);

        // 两条等强路径叠加提升 10*log10(2) ≈ 3.01 dB
        assert!((double - single - 10.0 * 2f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_db_round_trip() {
        let linear = db_to_linear(-72.5);
        assert!((linear_to_db(linear) + 72.5).abs() < 1e-9);
    }

    #[test]
    fn test_best_path_direct_in_open_space() {
        let scene = room();
        let config = SimulationConfig {
            high_precision: true,
            shadow_fading_std: 0.0,
            ..Default::default()
        };
        let tracer = MultipathRayTracer::new(&scene, config).unwrap();

        let tx = Vec3::new(2.0, 2.0, 1.5);
        let rx = Vec3::new(12.0, 2.0, 1.5);
        let path = tracer.trace_best_path(tx, rx).unwrap();

        assert_eq!(path.path_points, vec![tx, rx]);
        assert_eq!(path.num_bounces(), 0);
        let expected_loss = tracer.base().path_loss().free_space_loss(10.0);
        assert!((path.total_loss - expected_loss).abs() < 1e-9);
    }

    #[test]
    fn test_best_path_blocked_costs_more_than_direct() {
        let scene = walled_room();
        let config = SimulationConfig {
            high_precision: true,
            shadow_fading_std: 0.0,
            ..Default::default()
        };
        let tracer = MultipathRayTracer::new(&scene, config).unwrap();

        let tx = Vec3::new(5.0, 5.0, 1.5);
        let rx = Vec3::new(15.0, 5.0, 1.5);
        let path = tracer.trace_best_path(tx, rx).unwrap();

        // 路径以接收点闭合，且损耗高于无遮挡的直达损耗
        assert_eq!(*path.path_points.last().unwrap(), rx);
        assert!(path.num_bounces() >= 1);
        let direct_loss = tracer.base().path_loss().free_space_loss(10.0);
        assert!(path.total_loss > direct_loss);
    }

    #[test]
    fn test_multipath_signal_bounded_by_tx_power() {
        let scene = room();
        let mut tracer = MultipathRayTracer::new(&scene, multipath_config()).unwrap();

        let rssi = tracer
            .simulate_signal(Vec3::new(5.0, 5.0, 1.5), Vec3::new(10.0, 5.0, 1.5))
            .unwrap();
        assert!(rssi.is_finite());
        assert!(rssi < 20.0);
    }

    #[test]
    fn test_mode_dispatch_falls_back_to_base_model() {
        let scene = room();
        let config = SimulationConfig {
            multipath_enabled: false,
            high_precision: false,
            shadow_fading_std: 0.0,
            ..Default::default()
        };
        let mut tracer = MultipathRayTracer::new(&scene, config).unwrap();

        let tx = Vec3::new(0.0, 0.0, 1.5);
        let rx = Vec3::new(10.0, 0.0, 1.5);
        let rssi = tracer.simulate_signal(tx, rx).unwrap();

        let expected = 20.0 - tracer.base().path_loss().free_space_loss(10.0);
        assert!((rssi - expected).abs() < 1e-9);
    }

    #[test]
    fn test_batch_uses_fast_model() {
        let scene = room();
        let mut tracer = MultipathRayTracer::new(&scene, multipath_config()).unwrap();

        let matrix = tracer
            .simulate_signal_batch(
                &[Vec3::new(5.0, 5.0, 2.5)],
                &[Vec3::new(1.0, 1.0, 1.5), Vec3::new(9.0, 9.0, 1.5)],
            )
            .unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0].len(), 1);
        assert!(matrix.iter().all(|row| row[0].is_finite()));
    }
}
