/// 错误类型定义
///
/// 约定：
/// - 配置错误（未知算法、接收机数量不匹配）在构造时报出
/// - 数值退化（零距离、非正反射系数、零概率和）就地钳制，不作为错误传播
/// - I/O 错误（指纹库文件缺失/损坏）向调用方传播，不静默回退

use thiserror::Error;

/// emnav 统一错误类型
#[derive(Debug, Error)]
pub enum EmnavError {
    /// 配置错误（致命，构造时报出）
    #[error("配置错误: {0}")]
    Config(String),

    /// 指纹库文件 I/O 错误
    #[error("指纹库 I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 指纹库文件格式错误
    #[error("指纹库格式错误: {0}")]
    Format(#[from] serde_json::Error),

    /// 仿真过程错误（几何求交失败等）
    #[error("仿真错误: {0}")]
    Simulation(String),
}

/// crate 级 Result 别名
pub type Result<T> = std::result::Result<T, EmnavError>;
