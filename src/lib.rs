//! # dyntrans
//!
//! 面向宿主场景图的动态内容翻译与监控引擎。
//!
//! ## 模块组织
//!
//! - `host` - 宿主能力接口（场景图、数组）与内存实现
//! - `translation` - 模式引擎、节点观察、数组同步与编排服务
//! - `env` - 类型安全的环境变量
//! - `utils` - 文本规范化与占位符扫描

pub mod env;
pub mod host;
pub mod translation;
pub mod utils;

pub use host::{ArrayHost, ArrayKey, NodeId, SceneHost, TextHolder};
pub use translation::{EngineConfig, TranslationError, TranslationResult, TranslationService};

/// 初始化日志输出，级别取自 `DYNTRANS_LOG_LEVEL`
#[cfg(feature = "logging")]
pub fn init_logging() {
    use crate::env::EnvVar;

    let level = crate::env::core::LogLevel::get_or_default("info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(format!("dyntrans={}", level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // 重复初始化时保留已有的订阅者
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
