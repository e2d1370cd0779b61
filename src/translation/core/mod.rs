//! 翻译系统核心模块
//!
//! 把模式引擎接到宿主上：节点观察注册表按策略分级轮询显示节点，
//! 数组同步引擎在宿主数组被填充时按下标替换，翻译服务负责编排两者。
//!
//! ## 模块依赖关系
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── Translator (pipeline/translator.rs)
//!     │       ├── TranslationStore (storage/store.rs)
//!     │       └── PatternEngine (pipeline/engine.rs)
//!     ├── NodeRegistry (observer.rs)
//!     │       └── StrategyRules (strategy.rs)
//!     └── ArraySyncEngine (arrays.rs)
//! ```

pub mod arrays;
pub mod observer;
pub mod service;
pub mod strategy;

pub use arrays::{ArraySyncEngine, MonitoredArray, Readiness, ReadinessState, SyncStats};
pub use observer::{NodeRegistry, ObservedNode, PathCache, RegistryStats, RegistryTick};
pub use service::{ServiceStats, TickReport, TranslationService};
pub use strategy::{IntervalTimer, MonitorStrategy, PathRule, StrategyRules};
