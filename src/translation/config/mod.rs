//! 引擎配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, EngineConfig};

/// 配置常量
pub mod constants {
    // 节点轮询节奏（秒）
    pub const DEFAULT_FAST_INTERVAL: f32 = 0.1;
    pub const DEFAULT_SLOW_INTERVAL: f32 = 1.0;
    pub const DEFAULT_VISIBILITY_INTERVAL: f32 = 0.25;

    // 数组同步
    pub const DEFAULT_POPULATION_THRESHOLD: f32 = 0.5;
    pub const DEFAULT_RETRY_INTERVAL: f32 = 1.0;
    pub const DEFAULT_MAX_RETRIES: usize = 10;

    // 模式引擎
    pub const DEFAULT_MATCH_CACHE_SIZE: usize = 1024;
    /// 位置占位符上限 `{0}`..`{9}`
    pub const MAX_PLACEHOLDERS: usize = 10;
    /// 逗号列表模式的分隔符与拼接符
    pub const LIST_SEPARATOR: char = ',';
    pub const LIST_JOINER: &str = ", ";

    // 文本过滤
    pub const MIN_TEXT_LENGTH: usize = 1;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "dyntrans.toml",
        "dyntrans.json",
        ".dyntrans.toml",
        "~/.config/dyntrans/config.toml",
    ];

    // .env 文件搜索顺序
    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}
