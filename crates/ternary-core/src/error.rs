//! 核心错误定义

use crate::entity::Uid;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Point not found: {0}")]
    PointNotFound(Uid),

    #[error("Line not found: {0}")]
    LineNotFound(Uid),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// 引用了不存在的实体
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PointNotFound(_) | Self::LineNotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
