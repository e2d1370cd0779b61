//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，用于覆盖引擎配置文件中的值

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅在变量被显式设置时返回值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "DYNTRANS_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 翻译数据文件路径
    pub struct TranslationPath;
    impl EnvVar<String> for TranslationPath {
        const NAME: &'static str = "DYNTRANS_TRANSLATION_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation data file to load (overrides config)";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path must not be empty".to_string(),
                });
            }
            Ok(shellexpand::tilde(path).into_owned())
        }
    }
}

/// 节点轮询节奏相关环境变量
pub mod scheduler {
    use super::*;

    /// 快速组轮询间隔（秒）
    pub struct FastInterval;
    impl EnvVar<f32> for FastInterval {
        const NAME: &'static str = "DYNTRANS_FAST_INTERVAL";
        const DEFAULT: Option<f32> = Some(0.1);
        const DESCRIPTION: &'static str = "Seconds between fast-group checks";

        fn parse(value: &str) -> EnvResult<f32> {
            parse_seconds(value, Self::NAME, 0.001, 60.0)
        }
    }

    /// 慢速组轮询间隔（秒）
    pub struct SlowInterval;
    impl EnvVar<f32> for SlowInterval {
        const NAME: &'static str = "DYNTRANS_SLOW_INTERVAL";
        const DEFAULT: Option<f32> = Some(1.0);
        const DESCRIPTION: &'static str = "Seconds between slow-group checks and late path retries";

        fn parse(value: &str) -> EnvResult<f32> {
            parse_seconds(value, Self::NAME, 0.001, 600.0)
        }
    }

    /// 可见性组轮询间隔（秒）
    pub struct VisibilityInterval;
    impl EnvVar<f32> for VisibilityInterval {
        const NAME: &'static str = "DYNTRANS_VISIBILITY_INTERVAL";
        const DEFAULT: Option<f32> = Some(0.25);
        const DESCRIPTION: &'static str = "Seconds between visibility-transition checks";

        fn parse(value: &str) -> EnvResult<f32> {
            parse_seconds(value, Self::NAME, 0.001, 60.0)
        }
    }
}

/// 数组同步相关环境变量
pub mod arrays {
    use super::*;

    /// 填充比例阈值
    pub struct PopulationThreshold;
    impl EnvVar<f32> for PopulationThreshold {
        const NAME: &'static str = "DYNTRANS_POPULATION_THRESHOLD";
        const DEFAULT: Option<f32> = Some(0.5);
        const DESCRIPTION: &'static str =
            "Fraction of watched arrays that must be populated before syncing";

        fn parse(value: &str) -> EnvResult<f32> {
            let fraction: f32 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number".to_string(),
            })?;
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Threshold must be in (0, 1]".to_string(),
                });
            }
            Ok(fraction)
        }
    }

    /// 就绪检查重试间隔（秒）
    pub struct RetryInterval;
    impl EnvVar<f32> for RetryInterval {
        const NAME: &'static str = "DYNTRANS_RETRY_INTERVAL";
        const DEFAULT: Option<f32> = Some(1.0);
        const DESCRIPTION: &'static str = "Seconds between delayed readiness re-checks";

        fn parse(value: &str) -> EnvResult<f32> {
            parse_seconds(value, Self::NAME, 0.001, 600.0)
        }
    }

    /// 就绪检查最大重试次数
    pub struct MaxRetries;
    impl EnvVar<usize> for MaxRetries {
        const NAME: &'static str = "DYNTRANS_MAX_RETRIES";
        const DEFAULT: Option<usize> = Some(10);
        const DESCRIPTION: &'static str = "Delayed readiness re-checks before a best-effort pass";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 0, 1000)
        }
    }
}

/// 模式引擎相关环境变量
pub mod patterns {
    use super::*;

    /// 匹配结果缓存容量
    pub struct MatchCacheSize;
    impl EnvVar<usize> for MatchCacheSize {
        const NAME: &'static str = "DYNTRANS_MATCH_CACHE_SIZE";
        const DEFAULT: Option<usize> = Some(1024);
        const DESCRIPTION: &'static str = "Capacity of the pattern match result cache";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000_000)
        }
    }
}

/// 辅助函数
fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_seconds(value: &str, var_name: &str, min: f32, max: f32) -> EnvResult<f32> {
    let seconds: f32 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of seconds".to_string(),
    })?;

    if !(min..=max).contains(&seconds) {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} outside range {}..={}", seconds, min, max),
        });
    }

    Ok(seconds)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION,
        core::LogLevel::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        core::TranslationPath::NAME,
        core::TranslationPath::DESCRIPTION
    ));

    docs.push_str("\n## Scheduler Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        scheduler::FastInterval::NAME,
        scheduler::FastInterval::DESCRIPTION,
        scheduler::FastInterval::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        scheduler::SlowInterval::NAME,
        scheduler::SlowInterval::DESCRIPTION,
        scheduler::SlowInterval::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        scheduler::VisibilityInterval::NAME,
        scheduler::VisibilityInterval::DESCRIPTION,
        scheduler::VisibilityInterval::DEFAULT
    ));

    docs.push_str("\n## Array Synchronization\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        arrays::PopulationThreshold::NAME,
        arrays::PopulationThreshold::DESCRIPTION,
        arrays::PopulationThreshold::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        arrays::RetryInterval::NAME,
        arrays::RetryInterval::DESCRIPTION,
        arrays::RetryInterval::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        arrays::MaxRetries::NAME,
        arrays::MaxRetries::DESCRIPTION,
        arrays::MaxRetries::DEFAULT
    ));

    docs.push_str("\n## Pattern Engine\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        patterns::MatchCacheSize::NAME,
        patterns::MatchCacheSize::DESCRIPTION,
        patterns::MatchCacheSize::DEFAULT
    ));

    docs
}
