//! 数学基础类型与数值容差
//!
//! 平面坐标基于 nalgebra，所有计算使用 `f64`。

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;
pub type Matrix2 = nalgebra::Matrix2<f64>;

/// 零值保护（分量和为零、行列式奇异）
pub const EPSILON_ZERO: f64 = 1e-12;

/// 边界容差：归一化与三角形包含判断
pub const EPSILON_BOUNDARY: f64 = 1e-9;

/// 杠杆规则的共线判断容差（平面距离）
pub const TOLERANCE_ON_LINE: f64 = 1e-4;

/// 投影参数允许超出 [0,1] 的余量
pub const LEVER_PARAM_SLACK: f64 = 1e-3;

/// 两个组成视为相同的绝对容差
pub const COMPOSITION_ATOL: f64 = 1e-4;

/// 参考三角形高度（边长为1的等边三角形）
pub const TRIANGLE_HEIGHT: f64 = 0.866_025_403_784_438_6;

/// 二维叉积（z 分量）
#[inline]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// 消除微小噪声（如 -1e-17 -> 0.0）
#[inline]
pub fn snap_zero(value: f64) -> f64 {
    if value.abs() < EPSILON_ZERO {
        0.0
    } else {
        value
    }
}
