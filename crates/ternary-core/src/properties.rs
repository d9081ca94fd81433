//! 视觉属性
//!
//! 核心只对颜色、尺寸、标记和线型做语法校验，不解释它们如何绘制，
//! 具体绘制由渲染端决定。

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 网格步长下限
pub const GRID_STEP_MIN: f64 = 0.01;
/// 网格步长上限
pub const GRID_STEP_MAX: f64 = 0.5;
pub const GRID_STEP_DEFAULT: f64 = 0.1;

pub const MARKER_SIZE_DEFAULT: f64 = 6.0;
pub const LINE_WIDTH_DEFAULT: f64 = 1.5;

/// 十六进制颜色（`#RGB` 或 `#RRGGBB`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn black() -> Self {
        Self("#000000".to_string())
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        let value = value.trim();
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| CoreError::invalid(format!("color must start with '#': {:?}", value)))?;

        if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(CoreError::invalid(format!(
                "color must be #RGB or #RRGGBB: {:?}",
                value
            )));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Color {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// 点标记形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarkerSymbol {
    #[default]
    #[serde(rename = "o")]
    Circle,
    #[serde(rename = "s")]
    Square,
    #[serde(rename = "^")]
    TriangleUp,
    #[serde(rename = "v")]
    TriangleDown,
    #[serde(rename = "D")]
    Diamond,
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "x")]
    Cross,
    #[serde(rename = "P")]
    Plus,
    #[serde(rename = ".")]
    Dot,
    #[serde(rename = ",")]
    Pixel,
}

impl MarkerSymbol {
    pub const ALL: [MarkerSymbol; 10] = [
        MarkerSymbol::Circle,
        MarkerSymbol::Square,
        MarkerSymbol::TriangleUp,
        MarkerSymbol::TriangleDown,
        MarkerSymbol::Diamond,
        MarkerSymbol::Star,
        MarkerSymbol::Cross,
        MarkerSymbol::Plus,
        MarkerSymbol::Dot,
        MarkerSymbol::Pixel,
    ];

    /// 持久化使用的符号
    pub fn symbol(&self) -> &'static str {
        match self {
            MarkerSymbol::Circle => "o",
            MarkerSymbol::Square => "s",
            MarkerSymbol::TriangleUp => "^",
            MarkerSymbol::TriangleDown => "v",
            MarkerSymbol::Diamond => "D",
            MarkerSymbol::Star => "*",
            MarkerSymbol::Cross => "x",
            MarkerSymbol::Plus => "P",
            MarkerSymbol::Dot => ".",
            MarkerSymbol::Pixel => ",",
        }
    }
}

impl FromStr for MarkerSymbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|marker| marker.symbol() == s)
            .ok_or_else(|| CoreError::invalid(format!("unknown marker symbol: {:?}", s)))
    }
}

impl fmt::Display for MarkerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 线型（虚线模式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineType {
    #[default]
    #[serde(rename = "-")]
    Solid,
    #[serde(rename = "--")]
    Dashed,
    #[serde(rename = ":")]
    Dotted,
    #[serde(rename = "-.")]
    DashDot,
}

impl LineType {
    pub const ALL: [LineType; 4] = [
        LineType::Solid,
        LineType::Dashed,
        LineType::Dotted,
        LineType::DashDot,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            LineType::Solid => "-",
            LineType::Dashed => "--",
            LineType::Dotted => ":",
            LineType::DashDot => "-.",
        }
    }
}

impl FromStr for LineType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.symbol() == s)
            .ok_or_else(|| CoreError::invalid(format!("unknown line style: {:?}", s)))
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 点的视觉属性
#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    pub color: Color,
    pub size: f64,
    pub marker: MarkerSymbol,
    pub show_marker: bool,
    pub show_label: bool,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            color: Color::black(),
            size: MARKER_SIZE_DEFAULT,
            marker: MarkerSymbol::default(),
            show_marker: true,
            show_label: true,
        }
    }
}

impl PointStyle {
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_marker(mut self, marker: MarkerSymbol) -> Self {
        self.marker = marker;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_positive("size", self.size)
    }
}

/// 线的视觉属性
#[derive(Debug, Clone, PartialEq)]
pub struct LineStroke {
    pub color: Color,
    pub width: f64,
    pub style: LineType,
}

impl Default for LineStroke {
    fn default() -> Self {
        Self {
            color: Color::black(),
            width: LINE_WIDTH_DEFAULT,
            style: LineType::default(),
        }
    }
}

impl LineStroke {
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_style(mut self, style: LineType) -> Self {
        self.style = style;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_positive("width", self.width)
    }
}

/// 尺寸类数值必须有限且为正
pub fn validate_positive(name: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::invalid(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

pub fn validate_grid_step(step: f64) -> CoreResult<()> {
    if step.is_finite() && (GRID_STEP_MIN..=GRID_STEP_MAX).contains(&step) {
        Ok(())
    } else {
        Err(CoreError::invalid(format!(
            "grid step must lie in [{}, {}], got {}",
            GRID_STEP_MIN, GRID_STEP_MAX, step
        )))
    }
}
