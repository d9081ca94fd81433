//! 文件操作错误定义

use thiserror::Error;
use ternary_core::error::CoreError;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl FileError {
    /// 持久化数据本身有问题（而不是存储介质）
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            FileError::Json(_) | FileError::InvalidFormat(_) | FileError::UnsupportedVersion(_)
        )
    }

    pub fn is_io_error(&self) -> bool {
        matches!(self, FileError::Io(_))
    }
}
