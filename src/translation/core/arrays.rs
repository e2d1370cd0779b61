//! 数组同步引擎
//!
//! 宿主的某些字符串数组（新闻、滚动提示等）在不可预知的时刻才被填充。
//! 引擎记住每个数组的位置键与分类，发现数组由空变为非空时，按下标用
//! 分类的有序译文整体替换一次，之后不再访问。
//!
//! 就绪检查：统计已填充数组占比，达到阈值立即同步；否则按固定间隔
//! 重新检查，重试次数耗尽后做最后一次尽力同步并放弃。

use std::collections::HashMap;

use crate::host::{ArrayHost, ArrayKey};
use crate::translation::config::EngineConfig;
use crate::translation::error::{ErrorStats, LogOnce, TranslationError};
use crate::translation::storage::TranslationStore;

/// 被监控的宿主数组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredArray {
    pub key: ArrayKey,
    pub category: String,
    pub synchronized: bool,
    /// 因未就绪而跳过的次数
    pub attempts: usize,
    pub abandoned: bool,
}

/// 同步统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub watched: usize,
    pub synchronized: usize,
    pub translated_items: u64,
    pub passes: u64,
    pub readiness_retries: usize,
    pub abandoned: usize,
}

/// 就绪检查状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadinessState {
    /// 未安排检查
    Idle,
    /// 下一次 `update` 立即检查
    Pending,
    /// 等待下一次重新检查
    Waiting { elapsed: f32 },
    /// 已同步，此后每个重试间隔做一次增量同步
    Done { elapsed: f32 },
    /// 重试耗尽，已放弃
    GaveUp,
}

/// 就绪检查结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readiness {
    pub populated: usize,
    pub expected: usize,
}

impl Readiness {
    /// 已填充占比；没有可期待的数组时视为 1
    pub fn fraction(&self) -> f32 {
        if self.expected == 0 {
            1.0
        } else {
            self.populated as f32 / self.expected as f32
        }
    }

    pub fn meets(&self, threshold: f32) -> bool {
        self.fraction() >= threshold
    }
}

/// 数组同步引擎
pub struct ArraySyncEngine {
    categories: HashMap<String, Vec<String>>,
    arrays: Vec<MonitoredArray>,
    threshold: f32,
    retry_interval: f32,
    max_retries: usize,
    attempt_budget: Option<usize>,
    state: ReadinessState,
    retries: usize,
    log_once: LogOnce,
    errors: ErrorStats,
    stats: SyncStats,
}

impl ArraySyncEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            categories: HashMap::new(),
            arrays: Vec::new(),
            threshold: config.population_threshold,
            retry_interval: config.retry_interval,
            max_retries: config.max_retries,
            attempt_budget: config.array_attempt_budget,
            state: ReadinessState::Idle,
            retries: 0,
            log_once: LogOnce::new(),
            errors: ErrorStats::default(),
            stats: SyncStats::default(),
        }
    }

    /// 定义分类的有序译文列表，下标 i 对应宿主数组的下标 i
    pub fn define_category(&mut self, name: &str, translations: Vec<String>) {
        tracing::debug!("数组分类 {}: {} 条译文", name, translations.len());
        self.categories.insert(name.to_string(), translations);
    }

    /// 从词典复制指定分类
    pub fn define_category_from(&mut self, store: &TranslationStore, name: &str) -> bool {
        match store.category(name) {
            Some(values) => {
                self.define_category(name, values.to_vec());
                true
            }
            None => false,
        }
    }

    pub fn category(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// 监控宿主数组；同一位置键重复监控时更新分类
    ///
    /// 就绪检查处于空闲或已放弃状态时，新的监控会重新安排一次检查。
    pub fn watch(&mut self, key: ArrayKey, category: &str) {
        if matches!(self.state, ReadinessState::Idle | ReadinessState::GaveUp) {
            self.schedule_sync();
        }

        if let Some(array) = self.arrays.iter_mut().find(|a| a.key == key) {
            if array.category != category {
                tracing::debug!("数组 {} 的分类改为 {}", key, category);
                array.category = category.to_string();
            }
            return;
        }

        self.arrays.push(MonitoredArray {
            key,
            category: category.to_string(),
            synchronized: false,
            attempts: 0,
            abandoned: false,
        });
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&MonitoredArray> {
        self.arrays.iter().find(|a| &a.key == key)
    }

    pub fn arrays(&self) -> &[MonitoredArray] {
        &self.arrays
    }

    /// 同步所有已填充但尚未同步的数组，返回被替换为译文的元素数
    pub fn monitor_and_sync<H: ArrayHost + ?Sized>(&mut self, host: &mut H) -> usize {
        self.stats.passes += 1;
        let mut translated = 0;

        for array in self.arrays.iter_mut() {
            if array.synchronized || array.abandoned {
                continue;
            }

            let Some(translations) = self.categories.get(&array.category) else {
                self.log_once
                    .warn(&format!("未定义的分类 {}", array.category), &array.key);
                continue;
            };

            let items = match host.read_array(&array.key) {
                Ok(Some(items)) if !items.is_empty() => items,
                Ok(_) => {
                    Self::count_attempt(array, self.attempt_budget, &mut self.errors);
                    continue;
                }
                Err(e) => {
                    self.errors.record_error(&TranslationError::from(e.clone()));
                    self.log_once.warn(&format!("读取数组失败 {}", array.key), e);
                    Self::count_attempt(array, self.attempt_budget, &mut self.errors);
                    continue;
                }
            };

            let replaced = items.len().min(translations.len());
            let new_items: Vec<String> = items
                .into_iter()
                .enumerate()
                .map(|(i, original)| translations.get(i).cloned().unwrap_or(original))
                .collect();

            match host.replace_array(&array.key, new_items) {
                Ok(()) => {
                    array.synchronized = true;
                    translated += replaced;
                    tracing::info!(
                        "数组 {} 已同步 [{}]: 替换 {} 个元素",
                        array.key,
                        array.category,
                        replaced
                    );
                }
                Err(e) => {
                    self.errors.record_error(&TranslationError::from(e.clone()));
                    self.log_once.warn(&format!("替换数组失败 {}", array.key), e);
                    Self::count_attempt(array, self.attempt_budget, &mut self.errors);
                }
            }
        }

        self.stats.translated_items += translated as u64;
        translated
    }

    fn count_attempt(array: &mut MonitoredArray, budget: Option<usize>, errors: &mut ErrorStats) {
        array.attempts += 1;
        if let Some(budget) = budget {
            if array.attempts >= budget {
                array.abandoned = true;
                let error = TranslationError::RetryExhausted(format!(
                    "数组 {} 在 {} 次尝试后仍未就绪，放弃同步",
                    array.key, array.attempts
                ));
                tracing::warn!("{}", error);
                errors.record_error(&error);
            }
        }
    }

    /// 统计已填充的数组
    ///
    /// 只计入分类已定义且未放弃的数组；读取异常视为未填充。
    pub fn check_readiness<H: ArrayHost + ?Sized>(&mut self, host: &H) -> Readiness {
        let mut readiness = Readiness {
            populated: 0,
            expected: 0,
        };

        for array in &self.arrays {
            if array.abandoned || !self.categories.contains_key(&array.category) {
                continue;
            }
            readiness.expected += 1;

            if array.synchronized {
                readiness.populated += 1;
                continue;
            }

            match host.read_array(&array.key) {
                Ok(Some(items)) if !items.is_empty() => readiness.populated += 1,
                Ok(_) => {}
                Err(e) => {
                    self.errors.record_error(&TranslationError::from(e.clone()));
                    self.log_once.warn(&format!("读取数组失败 {}", array.key), e);
                }
            }
        }

        tracing::trace!(
            "数组就绪度: {}/{}",
            readiness.populated,
            readiness.expected
        );
        readiness
    }

    /// 安排一次就绪检查，在下一次 `update` 时执行
    pub fn schedule_sync(&mut self) {
        self.state = ReadinessState::Pending;
        self.retries = 0;
    }

    /// 推进就绪检查，返回本次被替换为译文的元素数
    pub fn update<H: ArrayHost + ?Sized>(&mut self, host: &mut H, dt: f32) -> usize {
        match self.state {
            ReadinessState::Idle | ReadinessState::GaveUp => 0,
            ReadinessState::Pending => self.check(host, false),
            ReadinessState::Waiting { elapsed } => {
                let elapsed = elapsed + dt.max(0.0);
                if elapsed >= self.retry_interval {
                    self.check(host, true)
                } else {
                    self.state = ReadinessState::Waiting { elapsed };
                    0
                }
            }
            ReadinessState::Done { elapsed } => {
                let elapsed = elapsed + dt.max(0.0);
                if elapsed >= self.retry_interval {
                    self.state = ReadinessState::Done { elapsed: 0.0 };
                    if self.has_unsynchronized() {
                        return self.monitor_and_sync(host);
                    }
                } else {
                    self.state = ReadinessState::Done { elapsed };
                }
                0
            }
        }
    }

    fn check<H: ArrayHost + ?Sized>(&mut self, host: &mut H, is_retry: bool) -> usize {
        let readiness = self.check_readiness(host);

        if readiness.meets(self.threshold) {
            let translated = self.monitor_and_sync(host);
            self.state = ReadinessState::Done { elapsed: 0.0 };
            return translated;
        }

        if is_retry {
            self.retries += 1;
        }

        if self.retries >= self.max_retries {
            let translated = self.monitor_and_sync(host);
            let error = TranslationError::RetryExhausted(format!(
                "数组就绪度 {}/{} 在 {} 次重试后仍低于阈值 {}，已尽力同步 {} 个元素",
                readiness.populated, readiness.expected, self.retries, self.threshold, translated
            ));
            tracing::warn!("{}", error);
            self.errors.record_error(&error);
            self.state = ReadinessState::GaveUp;
            return translated;
        }

        tracing::debug!(
            "数组就绪度 {}/{} 低于阈值，{} 秒后重试（第 {} 次）",
            readiness.populated,
            readiness.expected,
            self.retry_interval,
            self.retries + 1
        );
        self.state = ReadinessState::Waiting { elapsed: 0.0 };
        0
    }

    fn has_unsynchronized(&self) -> bool {
        self.arrays.iter().any(|a| !a.synchronized && !a.abandoned)
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    /// 宿主访问失败与重试耗尽的统计
    pub fn errors(&self) -> &ErrorStats {
        &self.errors
    }

    /// 已执行的重新检查次数
    pub fn readiness_retries(&self) -> usize {
        self.retries
    }

    /// 清空所有数组、分类、同步标记与重试计数
    pub fn reset(&mut self) {
        self.categories.clear();
        self.arrays.clear();
        self.state = ReadinessState::Idle;
        self.retries = 0;
        self.log_once.clear();
        self.errors.reset();
        self.stats = SyncStats::default();
        tracing::debug!("数组同步引擎已重置");
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            watched: self.arrays.len(),
            synchronized: self.arrays.iter().filter(|a| a.synchronized).count(),
            abandoned: self.arrays.iter().filter(|a| a.abandoned).count(),
            readiness_retries: self.retries,
            ..self.stats.clone()
        }
    }
}
