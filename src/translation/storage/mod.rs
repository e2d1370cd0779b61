//! 存储模块
//!
//! 提供翻译词典、翻译数据文件加载和模式匹配结果缓存。

pub mod cache;
pub mod loader;
pub mod store;

pub use cache::{CacheStats, MatchCache};
pub use loader::{parse_translations, LoadReport, PatternDef, TranslationData, TranslationLoader};
pub use store::{TranslationStore, DEFAULT_CATEGORY};
