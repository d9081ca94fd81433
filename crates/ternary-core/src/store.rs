//! 实体存储
//!
//! 按插入顺序保存点和线，并维护结构不变量：
//! - 线的两个端点必须存在且互不相同
//! - 线的两个端点坐标不能重合（零长度线）
//! - 删除点时级联删除所有引用它的线
//!
//! 为了让级联删除不必扫描全部线，存储维护一个反向索引：
//! 点UID -> 引用该点的线UID集合，在线的增删改时增量更新。
//!
//! 所有修改操作先完成校验再写入，失败时存储保持原状。

use crate::coords::{normalize, Composition};
use crate::entity::{Line, LineUpdate, Point, PointUpdate, Uid};
use crate::error::{CoreError, CoreResult};
use crate::math::{COMPOSITION_ATOL, EPSILON_BOUNDARY};
use crate::properties::{validate_positive, LineStroke, PointStyle};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// 点和线的集合
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    points: IndexMap<Uid, Point>,
    lines: IndexMap<Uid, Line>,
    /// 反向索引：点 -> 引用它的线
    line_refs: HashMap<Uid, IndexSet<Uid>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 点 ==========

    /// 添加点，坐标会先归一化
    pub fn add_point(
        &mut self,
        name: impl Into<String>,
        a: f64,
        b: f64,
        c: f64,
        style: PointStyle,
    ) -> CoreResult<Uid> {
        style.validate()?;
        let composition = normalize(a, b, c)?;

        let point = Point::new(name.into(), composition, style);
        let uid = point.uid.clone();

        tracing::debug!(uid = %uid, name = %point.name, "Added point");
        self.points.insert(uid.clone(), point);
        Ok(uid)
    }

    /// 部分更新点
    ///
    /// 若给出了任一坐标分量，则读取当前三个值、覆盖给出的分量后整体重新归一化。
    pub fn update_point(&mut self, uid: &Uid, update: PointUpdate) -> CoreResult<()> {
        let current = self
            .points
            .get(uid)
            .ok_or_else(|| CoreError::PointNotFound(uid.clone()))?;

        let mut updated = current.clone();

        if update.has_coordinate_changes() {
            let (a, b, c) = update.merged_raw(&current.composition());
            let composition = normalize(a, b, c)?;
            self.check_degenerate_lines(uid, &composition)?;
            updated.set_composition(composition);
        }

        if let Some(size) = update.size {
            validate_positive("size", size)?;
            updated.size = size;
        }
        if let Some(name) = update.name {
            updated.name = name;
        }
        if let Some(color) = update.color {
            updated.color = color;
        }
        if let Some(marker) = update.marker {
            updated.marker = marker;
        }
        if let Some(visible) = update.show_marker {
            updated.show_marker = visible;
        }
        if let Some(visible) = update.show_label {
            updated.show_label = visible;
        }

        tracing::debug!(uid = %uid, "Updated point");
        self.points.insert(uid.clone(), updated);
        Ok(())
    }

    /// 获取点的快照
    pub fn get_point(&self, uid: &Uid) -> CoreResult<Point> {
        self.point(uid).cloned()
    }

    /// 借用访问
    pub fn point(&self, uid: &Uid) -> CoreResult<&Point> {
        self.points
            .get(uid)
            .ok_or_else(|| CoreError::PointNotFound(uid.clone()))
    }

    /// 按插入顺序返回所有点的快照
    pub fn list_points(&self) -> Vec<Point> {
        self.points.values().cloned().collect()
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.points.values()
    }

    /// 删除点及所有引用它的线，返回被级联删除的线
    pub fn remove_point(&mut self, uid: &Uid) -> CoreResult<Vec<Uid>> {
        if !self.points.contains_key(uid) {
            return Err(CoreError::PointNotFound(uid.clone()));
        }

        let dependents = self.lines_of(uid);
        for line_uid in &dependents {
            self.detach_line(line_uid);
        }
        self.line_refs.remove(uid);
        self.points.shift_remove(uid);

        tracing::debug!(
            uid = %uid,
            cascaded = dependents.len(),
            "Removed point"
        );
        Ok(dependents)
    }

    pub fn contains_point(&self, uid: &Uid) -> bool {
        self.points.contains_key(uid)
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    // ========== 线 ==========

    /// 在两个已存在的点之间添加线
    pub fn add_line(&mut self, start_uid: &Uid, end_uid: &Uid, stroke: LineStroke) -> CoreResult<Uid> {
        self.validate_endpoints(start_uid, end_uid)?;
        stroke.validate()?;

        let line = Line::new(start_uid.clone(), end_uid.clone(), stroke);
        let uid = line.uid.clone();
        self.attach_line(line);

        tracing::debug!(uid = %uid, start = %start_uid, end = %end_uid, "Added line");
        Ok(uid)
    }

    /// 部分更新线，可以重新指定端点
    pub fn update_line(&mut self, uid: &Uid, update: LineUpdate) -> CoreResult<()> {
        let current = self
            .lines
            .get(uid)
            .ok_or_else(|| CoreError::LineNotFound(uid.clone()))?;

        let mut updated = current.clone();

        if update.has_endpoint_changes() {
            let start = update.start_uid.clone().unwrap_or_else(|| current.start_uid.clone());
            let end = update.end_uid.clone().unwrap_or_else(|| current.end_uid.clone());
            self.validate_endpoints(&start, &end)?;
            updated.start_uid = start;
            updated.end_uid = end;
        }

        if let Some(width) = update.width {
            validate_positive("width", width)?;
            updated.width = width;
        }
        if let Some(color) = update.color {
            updated.color = color;
        }
        if let Some(style) = update.style {
            updated.style = style;
        }

        // 先解除旧端点索引，再以新端点重新登记，位置保持不变
        self.unindex_line(uid);
        self.index_line(&updated);
        self.lines.insert(uid.clone(), updated);

        tracing::debug!(uid = %uid, "Updated line");
        Ok(())
    }

    pub fn get_line(&self, uid: &Uid) -> CoreResult<Line> {
        self.line(uid).cloned()
    }

    pub fn line(&self, uid: &Uid) -> CoreResult<&Line> {
        self.lines
            .get(uid)
            .ok_or_else(|| CoreError::LineNotFound(uid.clone()))
    }

    pub fn list_lines(&self) -> Vec<Line> {
        self.lines.values().cloned().collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    pub fn remove_line(&mut self, uid: &Uid) -> CoreResult<()> {
        if self.detach_line(uid).is_none() {
            return Err(CoreError::LineNotFound(uid.clone()));
        }
        tracing::debug!(uid = %uid, "Removed line");
        Ok(())
    }

    pub fn contains_line(&self, uid: &Uid) -> bool {
        self.lines.contains_key(uid)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 引用指定点的所有线，按线的插入顺序
    pub fn lines_of(&self, point_uid: &Uid) -> Vec<Uid> {
        let Some(refs) = self.line_refs.get(point_uid) else {
            return Vec::new();
        };
        let mut dependents: Vec<(usize, Uid)> = refs
            .iter()
            .filter_map(|line_uid| {
                self.lines
                    .get_index_of(line_uid)
                    .map(|index| (index, line_uid.clone()))
            })
            .collect();
        dependents.sort_by_key(|(index, _)| *index);
        dependents.into_iter().map(|(_, uid)| uid).collect()
    }

    /// 线的两个端点（起点，终点）
    pub fn line_endpoints(&self, line_uid: &Uid) -> CoreResult<(&Point, &Point)> {
        let line = self.line(line_uid)?;
        Ok((self.point(&line.start_uid)?, self.point(&line.end_uid)?))
    }

    /// 删除所有点和线
    pub fn clear(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.line_refs.clear();
        tracing::debug!("Cleared entity store");
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty()
    }

    // ========== 恢复（反序列化） ==========

    /// 以持久化的UID恢复点，校验所有不变量但不重新归一化
    pub fn restore_point(&mut self, point: Point) -> CoreResult<()> {
        if self.points.contains_key(&point.uid) {
            return Err(CoreError::invalid(format!("duplicate point uid: {}", point.uid)));
        }

        let comp = point.composition();
        let in_range = |v: f64| v.is_finite() && (-EPSILON_BOUNDARY..=1.0 + EPSILON_BOUNDARY).contains(&v);
        if !comp.as_array().into_iter().all(in_range) {
            return Err(CoreError::invalid(format!(
                "point {} has coordinates out of range: ({}, {}, {})",
                point.uid, comp.a, comp.b, comp.c
            )));
        }
        if (comp.sum() - 1.0).abs() > EPSILON_BOUNDARY {
            return Err(CoreError::invalid(format!(
                "point {} coordinates do not sum to 1: {}",
                point.uid,
                comp.sum()
            )));
        }
        validate_positive("size", point.size)?;

        self.points.insert(point.uid.clone(), point);
        Ok(())
    }

    /// 以持久化的UID恢复线，端点必须已经恢复
    pub fn restore_line(&mut self, line: Line) -> CoreResult<()> {
        if self.lines.contains_key(&line.uid) {
            return Err(CoreError::invalid(format!("duplicate line uid: {}", line.uid)));
        }
        if !self.points.contains_key(&line.start_uid) {
            return Err(CoreError::PointNotFound(line.start_uid.clone()));
        }
        if !self.points.contains_key(&line.end_uid) {
            return Err(CoreError::PointNotFound(line.end_uid.clone()));
        }
        if line.start_uid == line.end_uid {
            return Err(CoreError::invalid(format!(
                "line {} connects point {} to itself",
                line.uid, line.start_uid
            )));
        }
        self.validate_endpoints(&line.start_uid, &line.end_uid)?;
        validate_positive("width", line.width)?;

        self.attach_line(line);
        Ok(())
    }

    // ========== 私有方法 ==========

    fn validate_endpoints(&self, start_uid: &Uid, end_uid: &Uid) -> CoreResult<()> {
        let start = self.point(start_uid)?;
        let end = self.point(end_uid)?;

        if start_uid == end_uid {
            return Err(CoreError::invalid("line start and end must be different"));
        }
        if start.composition().is_close(&end.composition(), COMPOSITION_ATOL) {
            return Err(CoreError::invalid(format!(
                "'{}' and '{}' have identical coordinates",
                start.name, end.name
            )));
        }
        Ok(())
    }

    /// 新坐标不能让任何引用该点的线变成零长度
    fn check_degenerate_lines(&self, uid: &Uid, composition: &Composition) -> CoreResult<()> {
        for line_uid in self.lines_of(uid) {
            let Some(line) = self.lines.get(&line_uid) else {
                continue;
            };
            let other_uid = if &line.start_uid == uid {
                &line.end_uid
            } else {
                &line.start_uid
            };
            if let Some(other) = self.points.get(other_uid) {
                if composition.is_close(&other.composition(), COMPOSITION_ATOL) {
                    return Err(CoreError::invalid(format!(
                        "would create zero-length line with '{}'",
                        other.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn attach_line(&mut self, line: Line) {
        self.index_line(&line);
        self.lines.insert(line.uid.clone(), line);
    }

    fn detach_line(&mut self, uid: &Uid) -> Option<Line> {
        self.unindex_line(uid);
        self.lines.shift_remove(uid)
    }

    fn index_line(&mut self, line: &Line) {
        for endpoint in [&line.start_uid, &line.end_uid] {
            self.line_refs
                .entry(endpoint.clone())
                .or_default()
                .insert(line.uid.clone());
        }
    }

    fn unindex_line(&mut self, uid: &Uid) {
        let Some(line) = self.lines.get(uid) else {
            return;
        };
        for endpoint in [&line.start_uid, &line.end_uid] {
            if let Some(refs) = self.line_refs.get_mut(endpoint) {
                refs.shift_remove(uid);
                if refs.is_empty() {
                    self.line_refs.remove(endpoint);
                }
            }
        }
    }
}
