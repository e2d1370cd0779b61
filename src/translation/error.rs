//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。引擎热路径中的错误不会向上传播，
//! 而是在边界处记录后按“尚未就绪”处理。

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::host::HostError;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 模板编译错误（占位符不平衡、顺序错误等）
    #[error("模板无效: {0}")]
    PatternError(String),

    /// 正则表达式编译错误
    #[error("正则表达式无效: {0}")]
    RegexError(String),

    /// 翻译数据文件解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 宿主对象访问错误
    #[error("宿主访问错误: {0}")]
    HostError(String),

    /// 宿主对象尚不可用（节点或数组未构建）
    #[error("宿主对象尚不可用: {0}")]
    NotReady(String),

    /// 重试预算耗尽
    #[error("重试次数已耗尽: {0}")]
    RetryExhausted(String),

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::HostError(_) => true,
            TranslationError::NotReady(_) => true,
            TranslationError::IoError(_) => true,
            TranslationError::RetryExhausted(_) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::PatternError(_) => false,
            TranslationError::RegexError(_) => false,
            TranslationError::ParseError(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::PatternError(_) => ErrorSeverity::Warning,
            TranslationError::RegexError(_) => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Warning,
            TranslationError::HostError(_) => ErrorSeverity::Warning,
            TranslationError::NotReady(_) => ErrorSeverity::Info,
            TranslationError::RetryExhausted(_) => ErrorSeverity::Warning,
            TranslationError::IoError(_) => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::NotReady(_) => ErrorCategory::NotYetAvailable,
            TranslationError::PatternError(_)
            | TranslationError::RegexError(_)
            | TranslationError::ParseError(_) => ErrorCategory::MalformedInput,
            TranslationError::HostError(_) => ErrorCategory::UnexpectedHostState,
            TranslationError::RetryExhausted(_) => ErrorCategory::ResourceExhaustion,
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::IoError(_) | TranslationError::SerializationError(_) => {
                ErrorCategory::Io
            }
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let suffix = format!(" (上下文: {})", context);

        match &mut self {
            TranslationError::ConfigError(ref mut msg)
            | TranslationError::PatternError(ref mut msg)
            | TranslationError::RegexError(ref mut msg)
            | TranslationError::ParseError(ref mut msg)
            | TranslationError::HostError(ref mut msg)
            | TranslationError::NotReady(ref mut msg)
            | TranslationError::RetryExhausted(ref mut msg)
            | TranslationError::IoError(ref mut msg)
            | TranslationError::SerializationError(ref mut msg)
            | TranslationError::InternalError(ref mut msg) => msg.push_str(&suffix),
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 宿主节点/数组尚未构建或尚未填充，走重试或跳过路径
    NotYetAvailable,
    /// 模板、正则或数据行格式错误，加载时拒绝
    MalformedInput,
    /// 访问已解析对象时宿主抛出异常
    UnexpectedHostState,
    /// 重试预算耗尽
    ResourceExhaustion,
    Configuration,
    Io,
    Internal,
}

impl From<HostError> for TranslationError {
    fn from(error: HostError) -> Self {
        match error {
            HostError::NotFound(msg) => TranslationError::NotReady(msg),
            other => TranslationError::HostError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<regex::Error> for TranslationError {
    fn from(error: regex::Error) -> Self {
        TranslationError::RegexError(error.to_string())
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误统计信息
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_category: std::collections::HashMap<ErrorCategory, usize>,
    pub by_severity: std::collections::HashMap<ErrorSeverity, usize>,
    pub retryable_errors: usize,
    pub critical_errors: usize,
}

impl ErrorStats {
    /// 记录错误
    pub fn record_error(&mut self, error: &TranslationError) {
        self.total_errors += 1;

        let category = error.category();
        *self.by_category.entry(category).or_insert(0) += 1;

        let severity = error.severity();
        *self.by_severity.entry(severity).or_insert(0) += 1;

        if error.is_retryable() {
            self.retryable_errors += 1;
        }

        if severity == ErrorSeverity::Critical {
            self.critical_errors += 1;
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    /// 获取错误率
    pub fn error_rate(&self, total_operations: usize) -> f64 {
        if total_operations == 0 {
            0.0
        } else {
            self.total_errors as f64 / total_operations as f64
        }
    }
}

/// 按原因去重的日志记录器
///
/// 同一原因只输出一次警告，避免轮询循环刷屏。随所属组件的
/// `reset()`/`clear()` 一起清空。
#[derive(Debug, Default)]
pub struct LogOnce {
    seen: HashSet<String>,
}

impl LogOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次遇到该原因时记录警告，返回是否实际输出
    pub fn warn(&mut self, cause: &str, detail: impl fmt::Display) -> bool {
        if self.seen.contains(cause) {
            tracing::trace!("重复错误已抑制: {}", cause);
            return false;
        }
        tracing::warn!("{}: {}", cause, detail);
        self.seen.insert(cause.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建模板错误
    pub fn pattern_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::PatternError(msg.to_string())
    }

    /// 创建解析错误
    pub fn parse_error<T: fmt::Display>(line: usize, msg: T) -> TranslationError {
        TranslationError::ParseError(format!("第{}行: {}", line, msg))
    }
}
