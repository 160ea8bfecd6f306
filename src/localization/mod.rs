/// 定位模块
///
/// 该模块提供指纹匹配定位，支持：
/// - KNN / WKNN / 概率三种定位算法，统一接口可扩展
/// - 单次定位结果与批量精度评估报告

pub mod algorithms;
pub mod results;

pub use algorithms::*;
pub use results::*;
