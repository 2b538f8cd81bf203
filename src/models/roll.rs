//! 学号范围
//!
//! 学号 = 固定前缀 + 4 位补零数字后缀

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

/// 学号数字后缀的位数
pub const ROLL_DIGITS: usize = 4;

fn roll_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(.*?)(\d{4})$").expect("学号正则表达式无效"))
}

/// 拼接学号：前缀 + 补零到 4 位的数字
pub fn compose(prefix: &str, number: u32) -> String {
    format!("{}{:0width$}", prefix, number, width = ROLL_DIGITS)
}

/// 拆分学号为 (前缀, 数字后缀)，后缀不是 4 位数字时返回 None
pub fn split_roll(roll: &str) -> Option<(&str, u32)> {
    let caps = roll_pattern().captures(roll)?;
    let prefix = caps.get(1)?.as_str();
    let number = caps.get(2)?.as_str().parse().ok()?;
    Some((prefix, number))
}

/// 闭区间学号范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRange {
    prefix: String,
    start_num: u32,
    end_num: u32,
}

impl RollRange {
    pub fn new(prefix: impl Into<String>, start_num: u32, end_num: u32) -> Self {
        Self {
            prefix: prefix.into(),
            start_num,
            end_num,
        }
    }

    /// 从起止学号解析范围
    ///
    /// 前缀取自起始学号去掉末 4 位的部分；结束学号只取末 4 位数字，
    /// 其前缀不参与拼接，但总长度必须与起始学号相同
    pub fn parse(start_roll: &str, end_roll: &str) -> Result<Self, ValidationError> {
        let start_roll = start_roll.trim();
        let end_roll = end_roll.trim();

        let (prefix, start_num) = split_roll(start_roll).ok_or_else(|| {
            ValidationError::MalformedRoll {
                roll: start_roll.to_string(),
            }
        })?;
        let (_, end_num) = split_roll(end_roll).ok_or_else(|| ValidationError::MalformedRoll {
            roll: end_roll.to_string(),
        })?;

        if start_roll.chars().count() != end_roll.chars().count() {
            return Err(ValidationError::LengthMismatch {
                start: start_roll.to_string(),
                end: end_roll.to_string(),
            });
        }

        Ok(Self::new(prefix, start_num, end_num))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn start_num(&self) -> u32 {
        self.start_num
    }

    pub fn end_num(&self) -> u32 {
        self.end_num
    }

    /// 范围内学号数量（start > end 时为 0）
    pub fn len(&self) -> usize {
        if self.start_num > self.end_num {
            0
        } else {
            (self.end_num - self.start_num) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按升序生成范围内所有学号
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        (self.start_num..=self.end_num).map(move |n| compose(&self.prefix, n))
    }
}
