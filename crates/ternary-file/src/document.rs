//! 图表（聚合根）
//!
//! 组合实体存储、几何引擎和序列化，对外提供完整的操作接口。
//! 图表不是状态机，每个操作只依赖当前存储内容。
//!
//! 每次成功的修改都会先保存一份快照到撤销栈，并把图表标记为已修改；
//! 保存或加载后修改标记复位。
//!
//! 图表内部没有同步机制，跨线程修改需要调用方自行串行化；
//! 查询返回的都是独立副本，可以自由共享。

use crate::codec;
use crate::config::DiagramConfig;
use crate::error::FileError;
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::native;
use std::fmt;
use std::path::Path;
use ternary_core::coords::Composition;
use ternary_core::entity::{Line, LineUpdate, Point, PointUpdate, Uid};
use ternary_core::error::{CoreError, CoreResult};
use ternary_core::geometry::{GeometryEngine, IntersectionInfo, LeverInfo};
use ternary_core::properties::{validate_grid_step, LineStroke, PointStyle, GRID_STEP_DEFAULT};
use ternary_core::ratio::find_integer_ratio;
use ternary_core::store::EntityStore;

/// 撤销用的完整状态快照
#[derive(Debug, Clone)]
struct Snapshot {
    components: [String; 3],
    inverted: bool,
    grid_visible: bool,
    grid_step: f64,
    store: EntityStore,
}

/// 三元相图
#[derive(Debug, Clone)]
pub struct Diagram {
    components: [String; 3],
    inverted: bool,
    grid_visible: bool,
    grid_step: f64,
    store: EntityStore,
    history: History<Snapshot>,
    /// 自上次保存/加载以来是否有修改
    modified: bool,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    /// 创建组分为 A、B、C 的空图表
    pub fn new() -> Self {
        Self {
            components: ["A".to_string(), "B".to_string(), "C".to_string()],
            inverted: false,
            grid_visible: false,
            grid_step: GRID_STEP_DEFAULT,
            store: EntityStore::new(),
            history: History::new(DEFAULT_HISTORY_LIMIT),
            modified: false,
        }
    }

    /// 指定组分名称和朝向创建
    pub fn with_components<S: AsRef<str>>(components: &[S], inverted: bool) -> CoreResult<Self> {
        let mut diagram = Self::new();
        diagram.components = validate_components(components)?;
        diagram.inverted = inverted;
        Ok(diagram)
    }

    pub fn with_config(config: &DiagramConfig) -> CoreResult<Self> {
        validate_grid_step(config.grid_step)?;
        let mut diagram = Self::with_components(&config.components, config.inverted)?;
        diagram.grid_step = config.grid_step;
        diagram.grid_visible = config.grid_visible;
        diagram.history.set_limit(config.history_limit);
        Ok(diagram)
    }

    /// 反序列化时使用，实体已经在存储中恢复
    pub(crate) fn from_parts(
        components: [String; 3],
        inverted: bool,
        grid_visible: bool,
        grid_step: f64,
        store: EntityStore,
    ) -> Self {
        Self {
            components,
            inverted,
            grid_visible,
            grid_step,
            store,
            history: History::new(DEFAULT_HISTORY_LIMIT),
            modified: false,
        }
    }

    // =========================================================================
    // 属性
    // =========================================================================

    pub fn components(&self) -> &[String; 3] {
        &self.components
    }

    /// 只替换显示名称，不影响已有点的坐标轴
    pub fn set_components<S: AsRef<str>>(&mut self, names: &[S]) -> CoreResult<()> {
        let components = validate_components(names)?;
        self.touch("set components");
        self.components = components;
        Ok(())
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        if self.inverted != inverted {
            self.touch("set inverted");
            self.inverted = inverted;
        }
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn set_grid_visible(&mut self, visible: bool) {
        if self.grid_visible != visible {
            self.touch("set grid visible");
            self.grid_visible = visible;
        }
    }

    pub fn grid_step(&self) -> f64 {
        self.grid_step
    }

    pub fn set_grid_step(&mut self, step: f64) -> CoreResult<()> {
        validate_grid_step(step)?;
        self.touch("set grid step");
        self.grid_step = step;
        Ok(())
    }

    /// 只读访问实体存储（供渲染端遍历）
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    fn engine(&self) -> GeometryEngine {
        GeometryEngine::new(self.inverted)
    }

    // =========================================================================
    // 点
    // =========================================================================

    /// 使用默认样式添加点
    pub fn add_point(&mut self, name: impl Into<String>, a: f64, b: f64, c: f64) -> CoreResult<Uid> {
        self.add_point_styled(name, a, b, c, PointStyle::default())
    }

    pub fn add_point_styled(
        &mut self,
        name: impl Into<String>,
        a: f64,
        b: f64,
        c: f64,
        style: PointStyle,
    ) -> CoreResult<Uid> {
        self.commit("add point", |d| d.store.add_point(name, a, b, c, style))
    }

    pub fn update_point(&mut self, uid: &Uid, update: PointUpdate) -> CoreResult<()> {
        self.commit("update point", |d| d.store.update_point(uid, update))
    }

    pub fn get_point(&self, uid: &Uid) -> CoreResult<Point> {
        self.store.get_point(uid)
    }

    pub fn list_points(&self) -> Vec<Point> {
        self.store.list_points()
    }

    /// 删除点，返回被级联删除的线
    pub fn remove_point(&mut self, uid: &Uid) -> CoreResult<Vec<Uid>> {
        self.commit("remove point", |d| d.store.remove_point(uid))
    }

    // =========================================================================
    // 线
    // =========================================================================

    pub fn add_line(&mut self, start_uid: &Uid, end_uid: &Uid) -> CoreResult<Uid> {
        self.add_line_styled(start_uid, end_uid, LineStroke::default())
    }

    pub fn add_line_styled(&mut self, start_uid: &Uid, end_uid: &Uid, stroke: LineStroke) -> CoreResult<Uid> {
        self.commit("add line", |d| d.store.add_line(start_uid, end_uid, stroke))
    }

    pub fn update_line(&mut self, uid: &Uid, update: LineUpdate) -> CoreResult<()> {
        self.commit("update line", |d| d.store.update_line(uid, update))
    }

    pub fn get_line(&self, uid: &Uid) -> CoreResult<Line> {
        self.store.get_line(uid)
    }

    pub fn list_lines(&self) -> Vec<Line> {
        self.store.list_lines()
    }

    pub fn remove_line(&mut self, uid: &Uid) -> CoreResult<()> {
        self.commit("remove line", |d| d.store.remove_line(uid))
    }

    /// 删除所有点和线，组分、朝向和网格设置保持不变
    pub fn clear(&mut self) {
        if !self.store.is_empty() {
            self.touch("clear");
            self.store.clear();
        }
    }

    // =========================================================================
    // 撤销/重做
    // =========================================================================

    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = self.snapshot();
        let Some((label, previous)) = self.history.undo(current) else {
            return false;
        };
        self.restore(previous);
        self.modified = true;
        tracing::debug!(operation = label, remaining = self.history.undo_len(), "Undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = self.snapshot();
        let Some((label, next)) = self.history.redo(current) else {
            return false;
        };
        self.restore(next);
        self.modified = true;
        tracing::debug!(operation = label, remaining = self.history.redo_len(), "Redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_undo_history(&mut self) {
        self.history.clear();
    }

    pub fn history_limit(&self) -> usize {
        self.history.limit()
    }

    /// 0 表示关闭撤销
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    /// 自上次保存或加载以来是否有修改
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            components: self.components.clone(),
            inverted: self.inverted,
            grid_visible: self.grid_visible,
            grid_step: self.grid_step,
            store: self.store.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.components = snapshot.components;
        self.inverted = snapshot.inverted;
        self.grid_visible = snapshot.grid_visible;
        self.grid_step = snapshot.grid_step;
        self.store = snapshot.store;
    }

    /// 记录当前状态并标记已修改（调用方随后必然写入）
    fn touch(&mut self, label: &'static str) {
        if self.history.limit() > 0 {
            let snapshot = self.snapshot();
            self.history.record(label, snapshot);
        }
        self.modified = true;
    }

    /// 执行一次存储修改；失败时存储保持原状，不留历史
    fn commit<T>(
        &mut self,
        label: &'static str,
        op: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let before = (self.history.limit() > 0).then(|| self.snapshot());
        let value = op(self)?;
        if let Some(before) = before {
            self.history.record(label, before);
        }
        self.modified = true;
        Ok(value)
    }

    // =========================================================================
    // 计算
    // =========================================================================

    /// 两条线（按无限直线处理）的交点
    pub fn intersect(&self, line1_uid: &Uid, line2_uid: &Uid) -> CoreResult<IntersectionInfo> {
        let line_a = self.store.line_endpoints(line1_uid)?;
        let line_b = self.store.line_endpoints(line2_uid)?;
        Ok(self.engine().intersect(line_a, line_b))
    }

    /// 对结线应用杠杆规则
    pub fn lever_rule(&self, line_uid: &Uid, point_uid: &Uid) -> CoreResult<LeverInfo> {
        let (start, end) = self.store.line_endpoints(line_uid)?;
        let sample = self.store.point(point_uid)?;
        Ok(self.engine().lever_rule(start, end, sample))
    }

    /// 线延长后与三角形边界的交点
    pub fn extrapolate_line(&self, line_uid: &Uid) -> CoreResult<Vec<Composition>> {
        let (start, end) = self.store.line_endpoints(line_uid)?;
        Ok(self
            .engine()
            .line_triangle_intersections(&start.composition(), &end.composition()))
    }

    /// 点在线段上的投影
    pub fn project_onto_line(&self, line_uid: &Uid, point_uid: &Uid) -> CoreResult<Composition> {
        let (start, end) = self.store.line_endpoints(line_uid)?;
        let target = self.store.point(point_uid)?;
        Ok(self.engine().closest_point_on_segment(
            &start.composition(),
            &end.composition(),
            &target.composition(),
        ))
    }

    /// 点组成的最简整数比
    pub fn point_ratio(&self, point_uid: &Uid) -> CoreResult<Vec<u64>> {
        let point = self.store.point(point_uid)?;
        Ok(find_integer_ratio(&point.composition().as_array()))
    }

    // =========================================================================
    // 序列化
    // =========================================================================

    pub fn to_plain(&self) -> Result<serde_json::Value, FileError> {
        codec::to_plain(self)
    }

    pub fn from_plain(value: &serde_json::Value) -> Result<Self, FileError> {
        codec::from_plain(value)
    }

    pub fn to_json_string(&self) -> Result<String, FileError> {
        Ok(serde_json::to_string_pretty(&self.to_plain()?)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, FileError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_plain(&value)
    }

    /// 原子地保存到文件，成功后清除修改标记
    pub fn save(&mut self, path: &Path) -> Result<(), FileError> {
        native::save(self, path)?;
        self.modified = false;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, FileError> {
        native::load(path)
    }
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Diagram(components=[{}], points={}, lines={})",
            self.components.join(", "),
            self.store.point_count(),
            self.store.line_count()
        )
    }
}

/// 恰好三个名称，空名称替换为 C1/C2/C3
pub(crate) fn validate_components<S: AsRef<str>>(names: &[S]) -> CoreResult<[String; 3]> {
    let [a, b, c] = names else {
        return Err(CoreError::invalid(format!(
            "exactly 3 component names required, got {}",
            names.len()
        )));
    };

    let label = |index: usize, name: &S| {
        let name = name.as_ref().trim();
        if name.is_empty() {
            format!("C{}", index + 1)
        } else {
            name.to_string()
        }
    };

    Ok([label(0, a), label(1, b), label(2, c)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_validation() {
        assert!(Diagram::with_components(&["A", "B"], false).is_err());
        let diagram = Diagram::with_components(&["Water", "", "Salt"], true).unwrap();
        assert_eq!(diagram.components(), &["Water", "C2", "Salt"]);
        assert!(diagram.inverted());
    }

    #[test]
    fn test_set_components_keeps_points() {
        let mut diagram = Diagram::new();
        let uid = diagram.add_point("P", 0.2, 0.3, 0.5).unwrap();
        diagram.set_components(&["X", "Y", "Z"]).unwrap();
        let point = diagram.get_point(&uid).unwrap();
        assert!((point.c - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_grid_step_range() {
        let mut diagram = Diagram::new();
        assert!(diagram.set_grid_step(0.25).is_ok());
        assert!(diagram.set_grid_step(0.001).unwrap_err().is_invalid_input());
        assert_eq!(diagram.grid_step(), 0.25);
    }

    #[test]
    fn test_display() {
        let mut diagram = Diagram::new();
        let p1 = diagram.add_point("P1", 1.0, 0.0, 0.0).unwrap();
        let p2 = diagram.add_point("P2", 0.0, 1.0, 0.0).unwrap();
        diagram.add_line(&p1, &p2).unwrap();
        assert_eq!(diagram.to_string(), "Diagram(components=[A, B, C], points=2, lines=1)");
    }

    #[test]
    fn test_with_config() {
        let config = DiagramConfig {
            components: vec!["X".into(), "Y".into(), "Z".into()],
            inverted: true,
            grid_visible: true,
            grid_step: 0.05,
            history_limit: 5,
        };
        let diagram = Diagram::with_config(&config).unwrap();
        assert!(diagram.grid_visible());
        assert_eq!(diagram.grid_step(), 0.05);
        assert_eq!(diagram.history_limit(), 5);
        assert!(!diagram.is_modified());
        assert!(!diagram.can_undo());

        let bad = DiagramConfig {
            grid_step: 0.9,
            ..DiagramConfig::default()
        };
        assert!(Diagram::with_config(&bad).is_err());
    }

    #[test]
    fn test_point_ratio() {
        let mut diagram = Diagram::new();
        let uid = diagram.add_point("P", 2.0, 1.0, 1.0).unwrap();
        assert_eq!(diagram.point_ratio(&uid).unwrap(), vec![2, 1, 1]);
    }
}
