//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 节点观察、数组同步与编排服务
//! - **pipeline**: 模板编译与匹配、内置特殊情况、文本过滤
//! - **storage**: 翻译词典、数据文件加载、匹配缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust
//! use dyntrans::translation::{EngineConfig, TranslateOutcome, TranslationService};
//!
//! let mut service = TranslationService::new(EngineConfig::default())?;
//! service.load_translations_str("Found {0} = 发现 {0}\nIron = 铁\n");
//!
//! assert_eq!(
//!     service.translate_text("Found Iron", ""),
//!     TranslateOutcome::Translated("发现 铁".to_string())
//! );
//! # Ok::<(), dyntrans::translation::TranslationError>(())
//! ```

/// 配置管理模块
pub mod config;

/// 核心模块 - 节点观察、数组同步与编排服务
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 文本处理管道模块 - 模板、特殊情况、过滤与翻译入口
pub mod pipeline;

/// 存储模块 - 词典、数据加载与缓存
pub mod storage;

// ============================================================================
// 重新导出常用类型
// ============================================================================

pub use self::config::{ConfigManager, EngineConfig};
pub use self::core::{
    ArraySyncEngine, MonitorStrategy, NodeRegistry, ReadinessState, StrategyRules, TickReport,
    TranslationService,
};
pub use error::{TranslationError, TranslationResult};
pub use pipeline::{
    PatternEngine, PatternMode, SpecialCase, TranslateOutcome, TranslationPattern, Translator,
};
pub use storage::{parse_translations, TranslationData, TranslationLoader, TranslationStore};
