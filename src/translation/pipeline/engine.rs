//! 模式引擎
//!
//! 维护有序的模板列表（用户模板在前，内置模板在后），按顺序尝试，
//! 第一条产生结果的模板胜出。相同签名的模板只注册一次。

use std::collections::HashSet;

use crate::translation::config::constants;
use crate::translation::storage::loader::REGEX_KEY_PREFIX;
use crate::translation::storage::{CacheStats, MatchCache, PatternDef, TranslationStore};
use crate::utils::has_placeholders;

use super::pattern::{PatternMode, PatternSignature, TranslationPattern};
use super::special::{builtin_patterns, SpecialCase};

/// 模式引擎统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternStats {
    pub user_patterns: usize,
    pub builtin_patterns: usize,
    pub attempts: u64,
    pub matches: u64,
    pub rejected: u64,
    pub cache: CacheStats,
}

/// 模式引擎
pub struct PatternEngine {
    patterns: Vec<TranslationPattern>,
    signatures: HashSet<PatternSignature>,
    builtin_count: usize,
    cache: MatchCache,
    attempts: u64,
    matches: u64,
    rejected: u64,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(constants::DEFAULT_MATCH_CACHE_SIZE)
    }
}

impl PatternEngine {
    /// 创建模式引擎并注册内置模板
    pub fn new(cache_size: usize) -> Self {
        let mut engine = Self {
            patterns: Vec::new(),
            signatures: HashSet::new(),
            builtin_count: 0,
            cache: MatchCache::new(cache_size),
            attempts: 0,
            matches: 0,
            rejected: 0,
        };
        engine.seed_builtins();
        engine
    }

    fn seed_builtins(&mut self) {
        for pattern in builtin_patterns() {
            if self.signatures.insert(pattern.signature()) {
                self.patterns.push(pattern);
                self.builtin_count += 1;
            }
        }
    }

    /// 编译模板，失败时记录日志并返回 `None`
    pub fn compile(
        &mut self,
        original: &str,
        translated: &str,
        mode: PatternMode,
    ) -> Option<TranslationPattern> {
        match TranslationPattern::compile(original, translated, mode) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                self.rejected += 1;
                tracing::warn!("模板被拒绝 ({}): {}", mode, e);
                None
            }
        }
    }

    /// 编译数据文件中的模板定义
    ///
    /// `re:` 前缀选择正则模式；译文含占位符时参数先查词典再代入，否则译文
    /// 作为常量输出。
    pub fn compile_definition(&mut self, def: &PatternDef) -> Option<TranslationPattern> {
        if let Some(source) = def.original.strip_prefix(REGEX_KEY_PREFIX) {
            return self.compile(source, &def.translated, PatternMode::Regex);
        }

        let mode = if has_placeholders(&def.translated) {
            PatternMode::TemplateTranslated
        } else {
            PatternMode::Template
        };
        let pattern = self.compile(&def.original, &def.translated, mode);
        if pattern.is_none() {
            tracing::warn!("第 {} 行的模板定义无效 [{}]", def.line, def.category);
        }
        pattern
    }

    /// 注册模板，返回是否实际插入
    ///
    /// `at_front` 为真时插入列表最前（用户模板），否则追加到末尾。
    pub fn register(&mut self, pattern: TranslationPattern, at_front: bool) -> bool {
        let signature = pattern.signature();
        if !self.signatures.insert(signature) {
            tracing::debug!("重复的模板已忽略: {:?}", pattern);
            return false;
        }

        if at_front {
            self.patterns.insert(0, pattern);
        } else {
            self.patterns.push(pattern);
        }
        self.cache.clear();
        true
    }

    /// 编译并在最前面注册
    pub fn add(&mut self, original: &str, translated: &str, mode: PatternMode) -> bool {
        match self.compile(original, translated, mode) {
            Some(pattern) => self.register(pattern, true),
            None => false,
        }
    }

    /// 注册只在路径包含 `fragment` 的节点上生效的特殊情况
    pub fn register_special_case(&mut self, fragment: &str, case: SpecialCase) -> bool {
        self.register(case.scoped_pattern(fragment), true)
    }

    /// 依次尝试所有模板，返回第一条产生的结果
    pub fn try_match(&mut self, text: &str, path: &str, store: &TranslationStore) -> Option<String> {
        if let Some(cached) = self.cache.get(path, text) {
            return cached;
        }

        self.attempts += 1;
        let result = self
            .patterns
            .iter()
            .find_map(|pattern| pattern.apply(text, path, store));

        if let Some(output) = &result {
            self.matches += 1;
            tracing::trace!("模板命中: {:?} -> {:?}", text, output);
        }
        self.cache.put(path, text, result.clone());
        result
    }

    /// 丢弃所有用户模板，只保留内置模板
    pub fn reset(&mut self) {
        self.patterns.clear();
        self.signatures.clear();
        self.builtin_count = 0;
        self.cache.clear();
        self.attempts = 0;
        self.matches = 0;
        self.rejected = 0;
        self.seed_builtins();
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// 按优先级顺序遍历模板
    pub fn patterns(&self) -> impl Iterator<Item = &TranslationPattern> {
        self.patterns.iter()
    }

    pub fn stats(&self) -> PatternStats {
        PatternStats {
            user_patterns: self.patterns.len() - self.builtin_count,
            builtin_patterns: self.builtin_count,
            attempts: self.attempts,
            matches: self.matches,
            rejected: self.rejected,
            cache: self.cache.stats().clone(),
        }
    }
}
