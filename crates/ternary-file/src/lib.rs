//! 三元相图文件格式处理
//!
//! 支持：
//! - `Diagram` 聚合（组分、朝向、网格设置 + 实体存储，带撤销/重做）
//! - 通用嵌套值（JSON Value）转换
//! - `.ternary.json` 原生格式（带版本号，原子保存）

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod native;

pub use codec::FORMAT_VERSION;
pub use config::DiagramConfig;
pub use document::Diagram;
pub use error::FileError;
pub use history::{History, DEFAULT_HISTORY_LIMIT};
