//! 坐标模型
//!
//! 负责两件事：
//! - 把原始三组分输入归一化为合法的重心坐标（a + b + c = 1，各分量在 [0,1]）
//! - 重心坐标与参考三角形平面坐标之间的互相转换
//!
//! 参考三角形为边长 1 的等边三角形。正置时 C 在上方，倒置时 C 在下方；
//! 倒置只影响平面映射，不改变存储的重心坐标。

use crate::error::{CoreError, CoreResult};
use crate::math::{snap_zero, Matrix2, Point2, Vector2, EPSILON_ZERO, TRIANGLE_HEIGHT};
use serde::{Deserialize, Serialize};

/// 重心坐标三元组
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Composition {
    /// 直接构造，不做任何校验
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub const fn vertex_a() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    pub const fn vertex_b() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    pub const fn vertex_c() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn sum(&self) -> f64 {
        self.a + self.b + self.c
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }

    /// 逐分量绝对容差比较
    pub fn is_close(&self, other: &Composition, atol: f64) -> bool {
        (self.a - other.a).abs() < atol
            && (self.b - other.b).abs() < atol
            && (self.c - other.c).abs() < atol
    }

    /// 线性插值：self + t * (other - self)
    pub fn lerp(&self, other: &Composition, t: f64) -> Composition {
        Composition::new(
            self.a + t * (other.a - self.a),
            self.b + t * (other.b - self.b),
            self.c + t * (other.c - self.c),
        )
    }
}

/// 把原始输入归一化为重心坐标
///
/// 输入必须有限且非负，且和不为零。归一化后的噪声会被清除并夹到 [0,1]，
/// 再整体重新归一化一次。
pub fn normalize(a: f64, b: f64, c: f64) -> CoreResult<Composition> {
    for (name, value) in [("a", a), ("b", b), ("c", c)] {
        if !value.is_finite() {
            return Err(CoreError::invalid(format!(
                "coordinate '{}' must be finite, got {}",
                name, value
            )));
        }
        if snap_zero(value) < 0.0 {
            return Err(CoreError::invalid(format!(
                "coordinate '{}' must be non-negative, got {}",
                name, value
            )));
        }
    }

    let (a, b, c) = (snap_zero(a), snap_zero(b), snap_zero(c));
    let largest = a.max(b).max(c);
    if largest < EPSILON_ZERO {
        return Err(CoreError::invalid(format!(
            "cannot normalize composition with zero total: ({}, {}, {})",
            a, b, c
        )));
    }

    // 先除以最大分量再求和，避免大数相加溢出；缩放后总和落在 [1, 3]
    let (a, b, c) = (a / largest, b / largest, c / largest);
    let total = a + b + c;

    let clean = |v: f64| snap_zero(v / total).clamp(0.0, 1.0);
    let (na, nb, nc) = (clean(a), clean(b), clean(c));

    // 夹紧后再归一化一次，保证和严格接近 1
    let total = na + nb + nc;
    if !total.is_finite() || total < EPSILON_ZERO {
        return Err(CoreError::invalid(format!(
            "cannot normalize composition: ({}, {}, {})",
            a, b, c
        )));
    }
    Ok(Composition::new(na / total, nb / total, nc / total))
}

/// 参考三角形顶点 (A, B, C) 的平面坐标
pub fn vertices(inverted: bool) -> [Point2; 3] {
    if inverted {
        [
            Point2::new(0.0, TRIANGLE_HEIGHT),
            Point2::new(1.0, TRIANGLE_HEIGHT),
            Point2::new(0.5, 0.0),
        ]
    } else {
        [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, TRIANGLE_HEIGHT),
        ]
    }
}

/// 重心坐标 -> 平面坐标
pub fn to_planar(comp: &Composition, inverted: bool) -> Point2 {
    let [va, vb, vc] = vertices(inverted);
    Point2::from(va.coords * comp.a + vb.coords * comp.b + vc.coords * comp.c)
}

/// 平面坐标 -> 重心坐标
///
/// 通过三角形仿射基 [AB, AC] 的逆矩阵求解 P - A = b·AB + c·AC，
/// 再令 a = 1 - b - c。结果不做夹紧，三角形外的点会得到负分量。
pub fn from_planar(point: &Point2, inverted: bool) -> CoreResult<Composition> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return Err(CoreError::invalid(format!(
            "planar point must be finite, got ({}, {})",
            point.x, point.y
        )));
    }

    let [va, vb, vc] = vertices(inverted);
    let ab: Vector2 = vb - va;
    let ac: Vector2 = vc - va;
    let basis = Matrix2::new(ab.x, ac.x, ab.y, ac.y);
    let inverse = basis
        .try_inverse()
        .ok_or_else(|| CoreError::invalid("reference triangle is degenerate"))?;

    let solution = inverse * (point - va);
    let b = snap_zero(solution.x);
    let c = snap_zero(solution.y);
    let a = snap_zero(1.0 - b - c);

    Ok(Composition::new(a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_normalize_scales_by_sum() {
        let comp = normalize(1.0, 2.0, 3.0).unwrap();
        assert_close(comp.a, 1.0 / 6.0);
        assert_close(comp.b, 2.0 / 6.0);
        assert_close(comp.c, 3.0 / 6.0);
    }

    #[test]
    fn test_normalize_zero_sum_fails() {
        let err = normalize(0.0, 0.0, 0.0).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_normalize_rejects_negative_and_nan() {
        assert!(normalize(-0.5, 1.0, 1.0).unwrap_err().is_invalid_input());
        assert!(normalize(f64::NAN, 1.0, 1.0).unwrap_err().is_invalid_input());
        assert!(normalize(f64::INFINITY, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_normalize_huge_inputs() {
        let comp = normalize(1e308, 1e308, 1e308).unwrap();
        assert!(comp.is_finite());
        assert_close(comp.sum(), 1.0);
        assert_close(comp.a, 1.0 / 3.0);

        let comp = normalize(f64::MAX, f64::MAX, 0.0).unwrap();
        assert_close(comp.a, 0.5);
        assert_close(comp.b, 0.5);
        assert_eq!(comp.c, 0.0);
    }

    #[test]
    fn test_normalize_snaps_noise() {
        let comp = normalize(-1e-17, 0.5, 0.5).unwrap();
        assert_eq!(comp.a, 0.0);
        assert_close(comp.b, 0.5);
    }

    #[test]
    fn test_vertices_map_to_corners() {
        for inverted in [false, true] {
            let [va, vb, vc] = vertices(inverted);
            assert_eq!(to_planar(&Composition::vertex_a(), inverted), va);
            assert_eq!(to_planar(&Composition::vertex_b(), inverted), vb);
            assert_eq!(to_planar(&Composition::vertex_c(), inverted), vc);
        }
    }

    #[test]
    fn test_inverted_mirrors_vertically() {
        let comp = Composition::new(0.2, 0.3, 0.5);
        let up = to_planar(&comp, false);
        let down = to_planar(&comp, true);
        assert_close(up.x, down.x);
        assert_close(up.y + down.y, TRIANGLE_HEIGHT);
    }

    #[test]
    fn test_from_planar_inverts_to_planar() {
        let comp = Composition::new(0.5, 0.3, 0.2);
        for inverted in [false, true] {
            let back = from_planar(&to_planar(&comp, inverted), inverted).unwrap();
            assert_close(back.a, 0.5);
            assert_close(back.b, 0.3);
            assert_close(back.c, 0.2);
        }
    }

    #[test]
    fn test_from_planar_outside_is_negative() {
        let back = from_planar(&Point2::new(-0.5, 0.0), false).unwrap();
        assert!(back.b < 0.0);
        assert_close(back.sum(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_normalize_yields_simplex(
            a in 0.0f64..1e6,
            b in 0.0f64..1e6,
            c in 0.0f64..1e6,
        ) {
            prop_assume!(a + b + c > 1e-6);
            let comp = normalize(a, b, c).unwrap();
            prop_assert!((comp.sum() - 1.0).abs() < 1e-9);
            for v in comp.as_array() {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }

        #[test]
        fn prop_normalize_full_range_stays_finite(
            a in 0.0f64..f64::MAX,
            b in 0.0f64..f64::MAX,
            c in 0.0f64..f64::MAX,
        ) {
            prop_assume!(a.max(b).max(c) > 1e-6);
            let comp = normalize(a, b, c).unwrap();
            prop_assert!(comp.is_finite());
            prop_assert!((comp.sum() - 1.0).abs() < 1e-9);
        }
    }
}
