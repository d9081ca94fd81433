//! 实体定义
//!
//! 图表中只有两类实体：点（组成）和线（连接两个点的结线）。
//! 每个实体都有一个在所属图表内唯一、创建后不变、删除后也不复用的标识符。

use crate::coords::Composition;
use crate::properties::{Color, LineStroke, LineType, MarkerSymbol, PointStyle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 不透明的实体标识符（UUID v4 字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// 生成新的唯一标识符
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Uid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 组成点
///
/// `a`、`b`、`c` 始终是归一化后的重心坐标。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub uid: Uid,
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub color: Color,
    pub size: f64,
    pub marker: MarkerSymbol,
    pub show_marker: bool,
    pub show_label: bool,
}

impl Point {
    pub(crate) fn new(name: String, composition: Composition, style: PointStyle) -> Self {
        Self {
            uid: Uid::new(),
            name,
            a: composition.a,
            b: composition.b,
            c: composition.c,
            color: style.color,
            size: style.size,
            marker: style.marker,
            show_marker: style.show_marker,
            show_label: style.show_label,
        }
    }

    pub fn composition(&self) -> Composition {
        Composition::new(self.a, self.b, self.c)
    }

    pub fn style(&self) -> PointStyle {
        PointStyle {
            color: self.color.clone(),
            size: self.size,
            marker: self.marker,
            show_marker: self.show_marker,
            show_label: self.show_label,
        }
    }

    pub(crate) fn set_composition(&mut self, composition: Composition) {
        self.a = composition.a;
        self.b = composition.b;
        self.c = composition.c;
    }
}

/// 结线
///
/// 方向仅用于记录，几何计算把它当作无向线段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub uid: Uid,
    pub start_uid: Uid,
    pub end_uid: Uid,
    pub color: Color,
    pub width: f64,
    pub style: LineType,
}

impl Line {
    pub(crate) fn new(start_uid: Uid, end_uid: Uid, stroke: LineStroke) -> Self {
        Self {
            uid: Uid::new(),
            start_uid,
            end_uid,
            color: stroke.color,
            width: stroke.width,
            style: stroke.style,
        }
    }

    pub fn stroke(&self) -> LineStroke {
        LineStroke {
            color: self.color.clone(),
            width: self.width,
            style: self.style,
        }
    }

    /// 是否引用了指定的点
    pub fn references(&self, point_uid: &Uid) -> bool {
        &self.start_uid == point_uid || &self.end_uid == point_uid
    }
}

/// 点的部分更新请求，只应用显式给出的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointUpdate {
    pub name: Option<String>,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub c: Option<f64>,
    pub color: Option<Color>,
    pub size: Option<f64>,
    pub marker: Option<MarkerSymbol>,
    pub show_marker: Option<bool>,
    pub show_label: Option<bool>,
}

impl PointUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn coordinates(mut self, a: f64, b: f64, c: f64) -> Self {
        self.a = Some(a);
        self.b = Some(b);
        self.c = Some(c);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn marker(mut self, marker: MarkerSymbol) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn show_marker(mut self, visible: bool) -> Self {
        self.show_marker = Some(visible);
        self
    }

    pub fn show_label(mut self, visible: bool) -> Self {
        self.show_label = Some(visible);
        self
    }

    pub fn has_coordinate_changes(&self) -> bool {
        self.a.is_some() || self.b.is_some() || self.c.is_some()
    }

    /// 用当前值补齐未给出的分量，得到待归一化的原始三元组
    pub(crate) fn merged_raw(&self, current: &Composition) -> (f64, f64, f64) {
        (
            self.a.unwrap_or(current.a),
            self.b.unwrap_or(current.b),
            self.c.unwrap_or(current.c),
        )
    }
}

/// 线的部分更新请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineUpdate {
    pub start_uid: Option<Uid>,
    pub end_uid: Option<Uid>,
    pub color: Option<Color>,
    pub width: Option<f64>,
    pub style: Option<LineType>,
}

impl LineUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(mut self, start_uid: Uid, end_uid: Uid) -> Self {
        self.start_uid = Some(start_uid);
        self.end_uid = Some(end_uid);
        self
    }

    pub fn start(mut self, start_uid: Uid) -> Self {
        self.start_uid = Some(start_uid);
        self
    }

    pub fn end(mut self, end_uid: Uid) -> Self {
        self.end_uid = Some(end_uid);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn style(mut self, style: LineType) -> Self {
        self.style = Some(style);
        self
    }

    pub fn has_endpoint_changes(&self) -> bool {
        self.start_uid.is_some() || self.end_uid.is_some()
    }
}
