/// 路径损耗模型集成测试
///
/// 验证 Friis 自由空间损耗、材料反射/吸收查询和单段接收功率计算

#[cfg(test)]
mod tests {
    use emnav::config::SimulationConfig;
    use emnav::simulation::path_loss::{MaterialTable, PathLossModel, SPEED_OF_LIGHT};

    fn model() -> PathLossModel {
        PathLossModel::from_config(&SimulationConfig::default())
    }

    #[test]
    fn test_fspl_at_2_4ghz_10m() {
        let m = model();
        // 20*log10(10) + 20*log10(2.4e9) - 147.55 ≈ 60.05 dB
        let loss = m.free_space_loss(10.0);
        assert!((loss - 60.054).abs() < 0.01, "FSPL = {}", loss);
    }

    #[test]
    fn test_fspl_monotonic_in_distance() {
        let m = model();
        assert!(m.free_space_loss(2.0) < m.free_space_loss(4.0));
        assert!(m.free_space_loss(4.0) < m.free_space_loss(8.0));
        // 距离翻倍损耗增加 6.02 dB
        let delta = m.free_space_loss(8.0) - m.free_space_loss(4.0);
        assert!((delta - 20.0 * 2f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_fspl_monotonic_in_frequency() {
        let low = model();
        let high = PathLossModel::from_config(&SimulationConfig {
            tx_frequency: 5.8e9,
            ..Default::default()
        });
        assert!(high.free_space_loss(10.0) > low.free_space_loss(10.0));
    }

    #[test]
    fn test_fspl_self_distance_is_zero() {
        let m = model();
        assert_eq!(m.free_space_loss(0.0), 0.0);
        assert_eq!(m.free_space_loss(1e-7), 0.0);
    }

    #[test]
    fn test_wavelength_from_frequency() {
        let m = model();
        assert!((m.wavelength - SPEED_OF_LIGHT / 2.4e9).abs() < 1e-12);
    }

    #[test]
    fn test_reflection_coefficients_ordering() {
        let table = MaterialTable::new(SimulationConfig::default().materials);
        // 金属反射最强，混凝土最弱
        assert!(table.reflection_coefficient("metal") > table.reflection_coefficient("glass"));
        assert!(table.reflection_coefficient("glass") > table.reflection_coefficient("wood"));
        assert!(table.reflection_coefficient("wood") > table.reflection_coefficient("concrete"));
        // 未知材料取缺省值
        assert_eq!(
            table.reflection_coefficient("unobtainium"),
            table.reflection_coefficient("concrete")
        );
    }

    #[test]
    fn test_normal_incidence_reflection_loss() {
        let m = model();
        // 垂直入射 (角度 0)，金属: -20*log10(0.9) ≈ 0.92 dB
        let loss = m.reflection_loss("metal", 0.0);
        assert!((loss - (-20.0 * 0.9f64.log10())).abs() < 1e-12);
        // 反射越强损耗越小
        assert!(m.reflection_loss("metal", 0.0) < m.reflection_loss("concrete", 0.0));
    }

    #[test]
    fn test_received_power_composition() {
        let m = model();
        let direct = m.received_power(10.0, 0);
        assert!((direct - (20.0 - m.free_space_loss(10.0))).abs() < 1e-12);
        // 每次反射扣 5 dB
        assert!((direct - m.received_power(10.0, 3) - 15.0).abs() < 1e-12);
    }
}
