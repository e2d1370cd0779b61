//! 模式匹配结果缓存
//!
//! 以 (路径, 文本) 为键记住模式引擎的结果，包括“没有任何模式匹配”。
//! 由模式引擎独占持有，随 `reset()` 清空；词典重建前编排层必须先重置
//! 模式引擎，因此缓存的结果不会跨越两份词典。

use std::num::NonZeroUsize;

use lru::LruCache;

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
}

impl CacheStats {
    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

/// 匹配结果的 LRU 缓存
pub struct MatchCache {
    cache: LruCache<(String, String), Option<String>>,
    stats: CacheStats,
}

impl MatchCache {
    /// 创建新的缓存，容量为 0 时退化为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// 查询缓存；外层 `None` 表示未缓存，内层 `None` 表示已知无匹配
    pub fn get(&mut self, path: &str, text: &str) -> Option<Option<String>> {
        self.stats.total_requests += 1;
        let key = (path.to_string(), text.to_string());
        match self.cache.get(&key) {
            Some(result) => {
                self.stats.cache_hits += 1;
                Some(result.clone())
            }
            None => {
                self.stats.cache_misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, path: &str, text: &str, result: Option<String>) {
        self.cache.put((path.to_string(), text.to_string()), result);
        self.stats.total_entries = self.cache.len();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// 清空缓存与统计
    pub fn clear(&mut self) {
        self.cache.clear();
        self.stats = CacheStats::default();
    }
}
