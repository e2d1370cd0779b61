//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::core::strategy::MonitorStrategy;
use crate::translation::error::{TranslationError, TranslationResult};

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    // 节点轮询配置（秒）
    pub fast_interval: f32,
    pub slow_interval: f32,
    pub visibility_interval: f32,
    /// 没有路径规则命中时使用的策略
    pub default_strategy: MonitorStrategy,

    // 数组同步配置
    pub population_threshold: f32,
    pub retry_interval: f32,
    pub max_retries: usize,
    /// 单个数组的尝试预算；`None` 表示不限
    pub array_attempt_budget: Option<usize>,

    // 模式引擎配置
    pub match_cache_size: usize,
    /// 短于该字符数的文本不尝试翻译
    pub min_text_length: usize,

    // 翻译数据
    pub translation_paths: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_interval: constants::DEFAULT_FAST_INTERVAL,
            slow_interval: constants::DEFAULT_SLOW_INTERVAL,
            visibility_interval: constants::DEFAULT_VISIBILITY_INTERVAL,
            default_strategy: MonitorStrategy::Slow,

            population_threshold: constants::DEFAULT_POPULATION_THRESHOLD,
            retry_interval: constants::DEFAULT_RETRY_INTERVAL,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            array_attempt_budget: None,

            match_cache_size: constants::DEFAULT_MATCH_CACHE_SIZE,
            min_text_length: constants::MIN_TEXT_LENGTH,

            translation_paths: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        for (name, value) in [
            ("fast_interval", self.fast_interval),
            ("slow_interval", self.slow_interval),
            ("visibility_interval", self.visibility_interval),
            ("retry_interval", self.retry_interval),
        ] {
            if !(value > 0.0) {
                return Err(TranslationError::ConfigError(format!(
                    "{} 必须大于0，当前为 {}",
                    name, value
                )));
            }
        }

        if !(self.population_threshold > 0.0 && self.population_threshold <= 1.0) {
            return Err(TranslationError::ConfigError(format!(
                "population_threshold 必须在 (0, 1] 内，当前为 {}",
                self.population_threshold
            )));
        }

        if self.match_cache_size == 0 {
            return Err(TranslationError::ConfigError("匹配缓存容量不能为0".to_string()));
        }

        if self.array_attempt_budget == Some(0) {
            return Err(TranslationError::ConfigError(
                "单个数组的尝试预算不能为0".to_string(),
            ));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（类型安全环境变量系统）
    ///
    /// 只有显式设置的变量才会覆盖；解析失败的值被忽略并记录警告。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{arrays, patterns, scheduler, EnvVar};

        fn apply<T>(target: &mut T, value: Option<crate::env::EnvResult<T>>) {
            match value {
                Some(Ok(v)) => *target = v,
                Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
                None => {}
            }
        }

        apply(&mut self.fast_interval, scheduler::FastInterval::get_set());
        apply(&mut self.slow_interval, scheduler::SlowInterval::get_set());
        apply(
            &mut self.visibility_interval,
            scheduler::VisibilityInterval::get_set(),
        );
        apply(
            &mut self.population_threshold,
            arrays::PopulationThreshold::get_set(),
        );
        apply(&mut self.retry_interval, arrays::RetryInterval::get_set());
        apply(&mut self.max_retries, arrays::MaxRetries::get_set());
        apply(
            &mut self.match_cache_size,
            patterns::MatchCacheSize::get_set(),
        );

        match crate::env::core::TranslationPath::get_set() {
            Some(Ok(path)) => {
                tracing::info!("环境变量覆盖翻译数据路径: {}", path);
                self.translation_paths = vec![path];
            }
            Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
            None => {}
        }
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: EngineConfig,
    source: Option<String>,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let (mut config, source) = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config, source })
    }

    /// 从指定文件创建配置管理器（不搜索默认路径）
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        let expanded = shellexpand::tilde(path).into_owned();
        let mut config = Self::load_from_file(&expanded)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            source: Some(expanded),
        })
    }

    /// 获取配置
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    /// 配置来源文件，使用默认配置时为 `None`
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<(EngineConfig, Option<String>)> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                let config = Self::load_from_file(&expanded_path)?;
                return Ok((config, Some(expanded_path.into_owned())));
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok((EngineConfig::default(), None))
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = EngineConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
