//! 翻译管道模块
//!
//! 提供模板编译与匹配、内置特殊情况、文本过滤和翻译入口

pub mod engine;
pub mod filters;
pub mod pattern;
pub mod special;
pub mod translator;

// 重新导出主要类型
pub use engine::{PatternEngine, PatternStats};
pub use filters::{SkipReason, TextFilter};
pub use pattern::{PatternMode, PatternSignature, Template, TranslationPattern};
pub use special::{builtin_patterns, SpecialCase};
pub use translator::{TranslateOutcome, Translator};
