//! 撤销/重做历史
//!
//! 基于快照：每次提交修改前保存一份完整状态。
//! 撤销栈有容量上限，超出时丢弃最旧的记录；新的修改会清空重做栈。

use std::collections::VecDeque;

/// 默认撤销深度
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
struct Entry<T> {
    /// 产生该快照的操作（用于日志）
    label: &'static str,
    state: T,
}

/// 有界撤销/重做栈
#[derive(Debug, Clone)]
pub struct History<T> {
    undo: VecDeque<Entry<T>>,
    redo: Vec<Entry<T>>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    /// `limit == 0` 时关闭历史记录
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 调整上限，多余的最旧记录被丢弃
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.trim();
        if limit == 0 {
            self.redo.clear();
        }
    }

    /// 记录修改前的状态
    pub fn record(&mut self, label: &'static str, state: T) {
        if self.limit == 0 {
            return;
        }
        self.redo.clear();
        self.undo.push_back(Entry { label, state });
        self.trim();
    }

    /// 撤销：`current` 进入重做栈，返回上一个状态
    pub fn undo(&mut self, current: T) -> Option<(&'static str, T)> {
        let entry = self.undo.pop_back()?;
        self.redo.push(Entry {
            label: entry.label,
            state: current,
        });
        Some((entry.label, entry.state))
    }

    /// 重做：`current` 回到撤销栈，返回被撤销的状态
    pub fn redo(&mut self, current: T) -> Option<(&'static str, T)> {
        let entry = self.redo.pop()?;
        self.undo.push_back(Entry {
            label: entry.label,
            state: current,
        });
        self.trim();
        Some((entry.label, entry.state))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn trim(&mut self) {
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }
}
