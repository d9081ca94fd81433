//! 几何算法
//!
//! 所有算法都是无状态的，每次只处理两三个点或线：
//! - 两条直线求交 (intersect)
//! - 杠杆规则 (lever_rule)
//! - 三角形包含判断
//! - 直线与三角形边界求交（结线外推）
//! - 点到线段的投影
//! - 共线判断与面积
//!
//! 求交和投影在平面坐标中进行，结果再通过三角形仿射基的逆变换回重心坐标。

use crate::coords::{from_planar, to_planar, vertices, Composition};
use crate::entity::Point;
use crate::math::{
    cross, Point2, COMPOSITION_ATOL, EPSILON_BOUNDARY, EPSILON_ZERO, LEVER_PARAM_SLACK,
    TOLERANCE_ON_LINE,
};
use nalgebra::Vector3;
use serde::Serialize;

/// 求交结果
///
/// `found` 只表示两条直线（无限延长）不平行、交点存在；
/// 交点是否落在任一原始线段内不做判断。
/// `inside_triangle` 独立表示交点是否位于组成三角形内。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionInfo {
    pub found: bool,
    pub inside_triangle: bool,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub message: String,
}

impl IntersectionInfo {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            found: false,
            inside_triangle: false,
            a: None,
            b: None,
            c: None,
            message: message.into(),
        }
    }

    fn found(comp: Composition, inside_triangle: bool) -> Self {
        let message = if inside_triangle {
            "Intersection found inside triangle"
        } else {
            "Intersection found outside triangle"
        };
        Self {
            found: true,
            inside_triangle,
            a: Some(comp.a),
            b: Some(comp.b),
            c: Some(comp.c),
            message: message.to_string(),
        }
    }

    /// 交点的重心坐标（仅当 found）
    pub fn composition(&self) -> Option<Composition> {
        match (self.a, self.b, self.c) {
            (Some(a), Some(b), Some(c)) => Some(Composition::new(a, b, c)),
            _ => None,
        }
    }
}

/// 杠杆规则结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeverInfo {
    pub valid: bool,
    pub fraction_start: f64,
    pub fraction_end: f64,
    pub message: String,
}

impl LeverInfo {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            fraction_start: 0.0,
            fraction_end: 0.0,
            message: message.into(),
        }
    }
}

/// 几何引擎
///
/// 只携带三角形朝向，用于选择平面映射。
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryEngine {
    inverted: bool,
}

impl GeometryEngine {
    pub fn new(inverted: bool) -> Self {
        Self { inverted }
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    fn planar(&self, comp: &Composition) -> Point2 {
        to_planar(comp, self.inverted)
    }

    /// 求两条直线（各由两个端点确定）的交点
    pub fn intersect(&self, line_a: (&Point, &Point), line_b: (&Point, &Point)) -> IntersectionInfo {
        let result = self.solve_intersection(
            &line_a.0.composition(),
            &line_a.1.composition(),
            &line_b.0.composition(),
            &line_b.1.composition(),
        );

        match result {
            Some(comp) => IntersectionInfo::found(comp, is_inside_triangle(&comp)),
            None => IntersectionInfo::not_found("Lines are parallel"),
        }
    }

    /// 无限直线 p1p2 与 p3p4 的交点，平行或重合时返回 None
    pub fn solve_intersection(
        &self,
        p1: &Composition,
        p2: &Composition,
        p3: &Composition,
        p4: &Composition,
    ) -> Option<Composition> {
        let a = self.planar(p1);
        let b = self.planar(p2);
        let c = self.planar(p3);
        let d = self.planar(p4);

        // A + t·R = C + u·S
        let r = b - a;
        let s = d - c;
        let denom = cross(&r, &s);

        if denom.abs() < EPSILON_ZERO {
            tracing::warn!("Intersection solver: lines are parallel (denom ~ 0)");
            return None;
        }

        let t = cross(&(c - a), &s) / denom;
        let hit = a + r * t;

        match from_planar(&hit, self.inverted) {
            Ok(comp) => Some(comp),
            Err(err) => {
                tracing::warn!("Intersection solver: {}", err);
                None
            }
        }
    }

    /// 杠杆规则：样品点在线段上时给出两端的比例
    ///
    /// `fraction_start` 为起点到样品点的距离占线段长度的比例，
    /// `fraction_end = 1 - fraction_start`。
    ///
    /// 消息给出的是两相的相对含量：离样品点越近的端点占比越大，
    /// 因此起点相的含量是 `fraction_end`，终点相的含量是 `fraction_start`。
    pub fn lever_rule(&self, start: &Point, end: &Point, sample: &Point) -> LeverInfo {
        let s = self.planar(&start.composition());
        let e = self.planar(&end.composition());
        let p = self.planar(&sample.composition());

        let line = e - s;
        let to_sample = p - s;
        let len_sq = line.norm_squared();

        if len_sq < EPSILON_ZERO {
            return LeverInfo::invalid("Line is degenerate");
        }

        let distance = cross(&line, &to_sample).abs() / len_sq.sqrt();
        if distance > TOLERANCE_ON_LINE {
            return LeverInfo::invalid("Point is not collinear");
        }

        let t = to_sample.dot(&line) / len_sq;
        if t < -LEVER_PARAM_SLACK || t > 1.0 + LEVER_PARAM_SLACK {
            return LeverInfo::invalid("Point is outside the line segment");
        }

        let fraction_start = t.clamp(0.0, 1.0);
        let fraction_end = 1.0 - fraction_start;

        LeverInfo {
            valid: true,
            fraction_start,
            fraction_end,
            message: format!(
                "{}: {:.1}%, {}: {:.1}%",
                start.name,
                fraction_end * 100.0,
                end.name,
                fraction_start * 100.0
            ),
        }
    }

    /// 过 p、q 的直线与三角形边界的交点（0~2 个，去重）
    pub fn line_triangle_intersections(&self, p: &Composition, q: &Composition) -> Vec<Composition> {
        let edges = [
            (Composition::vertex_a(), Composition::vertex_b()),
            (Composition::vertex_b(), Composition::vertex_c()),
            (Composition::vertex_c(), Composition::vertex_a()),
        ];

        let mut hits: Vec<Composition> = Vec::with_capacity(2);
        for (edge_start, edge_end) in &edges {
            let Some(hit) = self.solve_intersection(p, q, edge_start, edge_end) else {
                continue;
            };
            if !hit.as_array().iter().all(|v| *v >= -EPSILON_BOUNDARY) {
                continue;
            }
            // 经过顶点时两条边会给出同一个点
            if hits.iter().any(|existing| existing.is_close(&hit, COMPOSITION_ATOL)) {
                continue;
            }
            hits.push(hit);
        }
        hits
    }

    /// target 在线段 start-end 上的最近点（投影参数夹到 [0,1]）
    pub fn closest_point_on_segment(
        &self,
        start: &Composition,
        end: &Composition,
        target: &Composition,
    ) -> Composition {
        let a = self.planar(start);
        let b = self.planar(end);
        let p = self.planar(target);

        let ab = b - a;
        let len_sq = ab.norm_squared();
        if len_sq < EPSILON_ZERO {
            return *start;
        }

        let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
        // 仿射映射保持线性插值
        start.lerp(end, t)
    }

    /// 参考三角形顶点
    pub fn vertices(&self) -> [Point2; 3] {
        vertices(self.inverted)
    }
}

/// 各分量都在 [0,1] 内（含容差）
pub fn is_inside_triangle(comp: &Composition) -> bool {
    comp.as_array()
        .iter()
        .all(|v| *v >= -EPSILON_BOUNDARY && *v <= 1.0 + EPSILON_BOUNDARY)
}

fn as_vector3(comp: &Composition) -> Vector3<f64> {
    Vector3::new(comp.a, comp.b, comp.c)
}

/// 重心坐标空间中的三角形面积
pub fn triangle_area(p1: &Composition, p2: &Composition, p3: &Composition) -> f64 {
    let v1 = as_vector3(p2) - as_vector3(p1);
    let v2 = as_vector3(p3) - as_vector3(p1);
    v1.cross(&v2).norm() / 2.0
}

/// 三点是否共线
pub fn are_collinear(p1: &Composition, p2: &Composition, p3: &Composition) -> bool {
    triangle_area(p1, p2, p3) * 2.0 < TOLERANCE_ON_LINE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PointStyle;
    use crate::store::EntityStore;

    fn point(name: &str, a: f64, b: f64, c: f64) -> Point {
        let mut store = EntityStore::new();
        let uid = store.add_point(name, a, b, c, PointStyle::default()).unwrap();
        store.get_point(&uid).unwrap()
    }

    #[test]
    fn test_intersection_on_edge() {
        let engine = GeometryEngine::new(false);
        let p1 = point("P1", 0.5, 0.3, 0.2);
        let p2 = point("P2", 0.2, 0.6, 0.2);
        let p3 = point("P3", 0.5, 0.0, 0.5);
        let p4 = point("P4", 0.2, 0.0, 0.8);

        let info = engine.intersect((&p1, &p2), (&p3, &p4));
        assert!(info.found);
        assert!(info.inside_triangle);
        let comp = info.composition().unwrap();
        assert!(comp.b.abs() < 1e-9);
        assert!((comp.c - 0.2).abs() < 1e-9);
        assert!((comp.a - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_intersection_independent_of_orientation() {
        let p1 = point("P1", 0.6, 0.2, 0.2);
        let p2 = point("P2", 0.1, 0.3, 0.6);
        let p3 = point("P3", 0.1, 0.8, 0.1);
        let p4 = point("P4", 0.4, 0.1, 0.5);

        let up = GeometryEngine::new(false).intersect((&p1, &p2), (&p3, &p4));
        let down = GeometryEngine::new(true).intersect((&p1, &p2), (&p3, &p4));
        assert!(up.composition().unwrap().is_close(&down.composition().unwrap(), 1e-9));
    }

    #[test]
    fn test_parallel_lines() {
        let engine = GeometryEngine::new(false);
        // a - b 恒定的两条线
        let p1 = point("P1", 0.4, 0.2, 0.4);
        let p2 = point("P2", 0.3, 0.1, 0.6);
        let p3 = point("P3", 0.6, 0.3, 0.1);
        let p4 = point("P4", 0.5, 0.2, 0.3);

        let info = engine.intersect((&p1, &p2), (&p3, &p4));
        assert!(!info.found);
        assert!(!info.inside_triangle);
        assert_eq!(info.message, "Lines are parallel");
        assert!(info.a.is_none());
    }

    #[test]
    fn test_intersection_outside_triangle() {
        let engine = GeometryEngine::new(false);
        // b = 0.6 与 a = 0.6 相交于 c = -0.2
        let p1 = point("P1", 0.3, 0.6, 0.1);
        let p2 = point("P2", 0.1, 0.6, 0.3);
        let p3 = point("P3", 0.6, 0.3, 0.1);
        let p4 = point("P4", 0.6, 0.1, 0.3);

        let info = engine.intersect((&p1, &p2), (&p3, &p4));
        assert!(info.found);
        assert!(!info.inside_triangle);
        assert!((info.c.unwrap() + 0.2).abs() < 1e-9);
        assert_eq!(info.message, "Intersection found outside triangle");
    }

    #[test]
    fn test_lever_midpoint() {
        let engine = GeometryEngine::new(false);
        let start = point("Phase A", 0.6, 0.2, 0.2);
        let end = point("Phase B", 0.2, 0.6, 0.2);
        let mid = point("M", 0.4, 0.4, 0.2);

        let info = engine.lever_rule(&start, &end, &mid);
        assert!(info.valid);
        assert!((info.fraction_start - 0.5).abs() < 1e-9);
        assert!((info.fraction_end - 0.5).abs() < 1e-9);
        assert_eq!(info.message, "Phase A: 50.0%, Phase B: 50.0%");
    }

    #[test]
    fn test_lever_split() {
        let engine = GeometryEngine::new(true);
        let start = point("S", 1.0, 0.0, 0.0);
        let end = point("E", 0.0, 1.0, 0.0);
        let sample = point("P", 0.4, 0.6, 0.0);

        let info = engine.lever_rule(&start, &end, &sample);
        assert!(info.valid);
        assert!((info.fraction_start - 0.6).abs() < 1e-9);
        assert!((info.fraction_end - 0.4).abs() < 1e-9);
        assert_eq!(info.message, "S: 40.0%, E: 60.0%");
    }

    #[test]
    fn test_lever_sample_on_start_is_all_start_phase() {
        let engine = GeometryEngine::new(false);
        let start = point("S", 1.0, 0.0, 0.0);
        let end = point("E", 0.0, 1.0, 0.0);

        let info = engine.lever_rule(&start, &end, &start);
        assert!(info.valid);
        assert!(info.fraction_start.abs() < 1e-9);
        assert_eq!(info.message, "S: 100.0%, E: 0.0%");
    }

    #[test]
    fn test_lever_not_collinear() {
        let engine = GeometryEngine::new(false);
        let start = point("A", 0.6, 0.2, 0.2);
        let end = point("B", 0.2, 0.6, 0.2);
        let off = point("X", 0.3, 0.3, 0.4);

        let info = engine.lever_rule(&start, &end, &off);
        assert!(!info.valid);
        assert_eq!(info.message, "Point is not collinear");
    }

    #[test]
    fn test_lever_outside_segment() {
        let engine = GeometryEngine::new(false);
        let start = point("A", 0.6, 0.2, 0.2);
        let end = point("B", 0.4, 0.4, 0.2);
        let beyond = point("X", 0.2, 0.6, 0.2);

        let info = engine.lever_rule(&start, &end, &beyond);
        assert!(!info.valid);
        assert_eq!(info.message, "Point is outside the line segment");
    }

    #[test]
    fn test_line_triangle_intersections() {
        let engine = GeometryEngine::new(false);
        let p = Composition::new(0.5, 0.3, 0.2);
        let q = Composition::new(0.2, 0.6, 0.2);

        let hits = engine.line_triangle_intersections(&p, &q);
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!((hit.c - 0.2).abs() < 1e-9);
            assert!(hit.a.abs() < 1e-9 || hit.b.abs() < 1e-9);
        }
    }

    #[test]
    fn test_line_through_vertex_deduplicated() {
        let engine = GeometryEngine::new(false);
        // 过顶点 C 的中线
        let hits = engine.line_triangle_intersections(
            &Composition::new(0.0, 0.0, 1.0),
            &Composition::new(0.25, 0.25, 0.5),
        );
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_closest_point_on_segment() {
        let engine = GeometryEngine::new(false);
        let start = Composition::vertex_a();
        let end = Composition::vertex_b();

        let proj = engine.closest_point_on_segment(&start, &end, &Composition::new(0.25, 0.25, 0.5));
        assert!((proj.a - 0.5).abs() < 1e-9);
        assert!((proj.b - 0.5).abs() < 1e-9);
        assert!(proj.c.abs() < 1e-9);

        let clamped = engine.closest_point_on_segment(&start, &end, &Composition::vertex_a());
        assert!(clamped.is_close(&start, 1e-12));
    }

    #[test]
    fn test_collinear_and_area() {
        let a = Composition::vertex_a();
        let b = Composition::vertex_b();
        let mid = Composition::new(0.5, 0.5, 0.0);
        assert!(are_collinear(&a, &b, &mid));
        assert!(!are_collinear(&a, &b, &Composition::vertex_c()));
        assert!(triangle_area(&a, &b, &mid) < 1e-12);
        assert!(triangle_area(&a, &b, &Composition::vertex_c()) > 0.1);
    }

    #[test]
    fn test_inside_triangle_tolerance() {
        assert!(is_inside_triangle(&Composition::new(1.0 + 1e-12, -1e-12, 0.0)));
        assert!(!is_inside_triangle(&Composition::new(1.1, -0.1, 0.0)));
    }
}
