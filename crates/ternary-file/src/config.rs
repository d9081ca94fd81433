//! 图表构造参数
//!
//! 由命令行等外层组装后交给 [`Diagram::with_config`](crate::Diagram::with_config)，
//! 核心本身不读取环境变量或全局配置。

use crate::error::FileError;
use crate::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use ternary_core::properties::GRID_STEP_DEFAULT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// 三个组分名称
    pub components: Vec<String>,
    /// 倒置三角形（C 在下方）
    pub inverted: bool,
    pub grid_visible: bool,
    pub grid_step: f64,
    /// 撤销深度，0 关闭撤销
    pub history_limit: usize,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            components: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            inverted: false,
            grid_visible: false,
            grid_step: GRID_STEP_DEFAULT,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl DiagramConfig {
    /// 从 JSON 文件读取，缺失字段取默认值
    pub fn load(path: &Path) -> Result<Self, FileError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DiagramConfig = serde_json::from_str(r#"{"inverted": true}"#).unwrap();
        assert!(config.inverted);
        assert_eq!(config.components, vec!["A", "B", "C"]);
        assert_eq!(config.grid_step, GRID_STEP_DEFAULT);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }
}
