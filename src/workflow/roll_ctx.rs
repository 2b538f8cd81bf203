//! 学号处理上下文
//!
//! 封装"我正在处理第几个学号"这一信息

use std::fmt::Display;

/// 学号处理上下文
#[derive(Debug, Clone)]
pub struct RollCtx {
    /// 学号
    pub roll: String,

    /// 在本次运行中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次运行的学号总数
    pub total: usize,
}

impl RollCtx {
    pub fn new(roll: String, index: usize, total: usize) -> Self {
        Self { roll, index, total }
    }

    /// 该学号 PDF 在暂存目录中的文件名
    pub fn file_name(&self) -> String {
        format!("{}.pdf", self.roll)
    }
}

impl Display for RollCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[学号 {} {}/{}]", self.roll, self.index, self.total)
    }
}
