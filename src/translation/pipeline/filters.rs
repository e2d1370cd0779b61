//! 文本过滤器模块
//!
//! 在查词典和匹配模板之前廉价地拒绝不值得尝试的文本

use crate::translation::config::constants;

/// 跳过原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 空串或只有空白
    Blank,
    /// 短于最小长度
    TooShort,
    /// 纯数字或纯符号
    NumbersOrSymbols,
    /// 看起来是链接
    Url,
}

/// 文本过滤器
#[derive(Debug, Clone)]
pub struct TextFilter {
    min_length: usize,
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new() -> Self {
        Self {
            min_length: constants::MIN_TEXT_LENGTH,
        }
    }

    /// 指定最小字符数
    pub fn with_min_length(min_length: usize) -> Self {
        Self { min_length }
    }

    /// 判断文本是否值得尝试翻译
    pub fn should_translate(&self, text: &str) -> bool {
        self.skip_reason(text).is_none()
    }

    /// 返回跳过原因，值得尝试时返回 `None`
    pub fn skip_reason(&self, text: &str) -> Option<SkipReason> {
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Some(SkipReason::Blank);
        }

        if trimmed.chars().count() < self.min_length {
            return Some(SkipReason::TooShort);
        }

        if self.is_pure_symbols_or_numbers(trimmed) {
            return Some(SkipReason::NumbersOrSymbols);
        }

        if self.is_url(trimmed) {
            return Some(SkipReason::Url);
        }

        None
    }

    /// 检查是否为URL
    fn is_url(&self, text: &str) -> bool {
        (text.starts_with("http://") || text.starts_with("https://") || text.starts_with("ftp://"))
            && !text.chars().any(char::is_whitespace)
    }

    /// 检查是否为纯符号或数字
    fn is_pure_symbols_or_numbers(&self, text: &str) -> bool {
        text.chars()
            .all(|c| c.is_numeric() || c.is_ascii_punctuation() || c.is_whitespace())
    }
}
