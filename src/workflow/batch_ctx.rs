//! 批次处理上下文
//!
//! 封装"我正在处理第几批、哪个文件夹"这一信息

use std::fmt::Display;

/// 批次处理上下文
#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// 批次序号（从1开始，仅用于日志显示）
    pub batch_index: usize,

    /// 批次总数
    pub batch_total: usize,

    /// 来源文件夹名
    pub folder: String,

    /// 是否为第一批（只有第一批的第一页使用指定页码）
    pub is_first: bool,
}

impl BatchCtx {
    pub fn new(batch_index: usize, batch_total: usize, folder: impl Into<String>) -> Self {
        Self {
            batch_index,
            batch_total,
            folder: folder.into(),
            is_first: batch_index == 1,
        }
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[批次 {}/{} {}]", self.batch_index, self.batch_total, self.folder)
    }
}
