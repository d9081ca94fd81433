//! 图表与通用嵌套值（JSON Value）之间的转换
//!
//! 输出结构：
//!
//! ```text
//! { version, components, inverted, grid_visible, grid_step, points: [...], lines: [...] }
//! ```
//!
//! 读取时忽略未知字段；UID 和插入顺序原样保留，所有实体不变量重新校验。

use crate::document::{validate_components, Diagram};
use crate::error::FileError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ternary_core::entity::{Line, Point};
use ternary_core::properties::validate_grid_step;
use ternary_core::store::EntityStore;

/// 当前格式版本
pub const FORMAT_VERSION: u64 = 1;

/// 写出时借用图表内容，避免克隆实体
#[derive(Serialize)]
struct DiagramFileRef<'a> {
    version: u64,
    components: &'a [String; 3],
    inverted: bool,
    grid_visible: bool,
    grid_step: f64,
    points: Vec<&'a Point>,
    lines: Vec<&'a Line>,
}

#[derive(Deserialize)]
struct DiagramFile {
    components: Vec<String>,
    inverted: bool,
    grid_visible: bool,
    grid_step: f64,
    points: Vec<Point>,
    lines: Vec<Line>,
}

/// 转换为通用嵌套值
pub fn to_plain(diagram: &Diagram) -> Result<Value, FileError> {
    let file = DiagramFileRef {
        version: FORMAT_VERSION,
        components: diagram.components(),
        inverted: diagram.inverted(),
        grid_visible: diagram.grid_visible(),
        grid_step: diagram.grid_step(),
        points: diagram.store().points().collect(),
        lines: diagram.store().lines().collect(),
    };
    Ok(serde_json::to_value(file)?)
}

/// 从通用嵌套值重建图表
pub fn from_plain(value: &Value) -> Result<Diagram, FileError> {
    let object = value
        .as_object()
        .ok_or_else(|| FileError::InvalidFormat("diagram must be a JSON object".to_string()))?;

    let version = object
        .get("version")
        .ok_or_else(|| FileError::InvalidFormat("missing field `version`".to_string()))?;
    let version = version
        .as_u64()
        .ok_or_else(|| FileError::InvalidFormat(format!("invalid version tag: {}", version)))?;
    if version != FORMAT_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "version {} (supported: {})",
            version, FORMAT_VERSION
        )));
    }

    let file = DiagramFile::deserialize(value).map_err(|e| FileError::InvalidFormat(e.to_string()))?;

    let components = validate_components(&file.components).map_err(invalid_format)?;
    validate_grid_step(file.grid_step).map_err(invalid_format)?;

    let mut store = EntityStore::new();
    for point in file.points {
        store.restore_point(point).map_err(invalid_format)?;
    }
    for line in file.lines {
        store.restore_line(line).map_err(invalid_format)?;
    }

    Ok(Diagram::from_parts(
        components,
        file.inverted,
        file.grid_visible,
        file.grid_step,
        store,
    ))
}

fn invalid_format(err: impl std::fmt::Display) -> FileError {
    FileError::InvalidFormat(err.to_string())
}
