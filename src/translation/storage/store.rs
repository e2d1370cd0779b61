//! 翻译词典存储
//!
//! 规范化键 → 译文的查找表，外加按分类追加顺序排列的译文列表
//! （数组同步引擎按下标消费）。引擎只读使用，只有编排层在两次 tick
//! 之间重建它。

use std::collections::{HashMap, HashSet};

use crate::utils::normalize;

/// 未写分类头时条目所属的分类
pub const DEFAULT_CATEGORY: &str = "default";

/// 翻译词典
#[derive(Debug, Clone, Default)]
pub struct TranslationStore {
    entries: HashMap<String, String>,
    categories: HashMap<String, Vec<String>>,
    category_order: Vec<String>,
    translated_values: HashSet<String>,
}

impl TranslationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入条目，同时追加到分类的有序列表
    ///
    /// 重复键以后者为准，但有序列表仍按出现顺序保留每一条。
    pub fn insert(&mut self, category: &str, key: &str, value: &str) {
        let normalized = normalize(key);
        if normalized.is_empty() {
            return;
        }

        if let Some(previous) = self.entries.insert(normalized, value.to_string()) {
            if previous != value {
                tracing::debug!("键 {:?} 的译文被覆盖: {:?} -> {:?}", key, previous, value);
            }
        }
        self.translated_values.insert(normalize(value));

        if !self.categories.contains_key(category) {
            self.category_order.push(category.to_string());
        }
        self.categories
            .entry(category.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// 直接定义分类的有序译文列表（替换已有列表）
    pub fn define_category(&mut self, category: &str, values: Vec<String>) {
        for value in &values {
            self.translated_values.insert(normalize(value));
        }
        if !self.categories.contains_key(category) {
            self.category_order.push(category.to_string());
        }
        self.categories.insert(category.to_string(), values);
    }

    /// 按规范化后的源文本查找译文
    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(&normalize(text)).map(String::as_str)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(&normalize(text))
    }

    /// 文本本身是否已经是某条译文
    pub fn is_translated_value(&self, text: &str) -> bool {
        let normalized = normalize(text);
        !normalized.is_empty() && self.translated_values.contains(&normalized)
    }

    /// 分类的有序译文列表
    pub fn category(&self, name: &str) -> Option<&[String]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    /// 按首次出现顺序列出分类名
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.category_order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.categories.clear();
        self.category_order.clear();
        self.translated_values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_normalized() {
        let mut store = TranslationStore::new();
        store.insert("ui", "Start Game", "开始游戏");

        assert_eq!(store.get("start game"), Some("开始游戏"));
        assert_eq!(store.get("  START\tGAME "), Some("开始游戏"));
        assert!(store.get("Start").is_none());
    }

    #[test]
    fn test_category_keeps_append_order() {
        let mut store = TranslationStore::new();
        store.insert("day", "Monday", "MON");
        store.insert("day", "Tuesday", "TUE");
        store.insert("month", "January", "JAN");

        assert_eq!(store.category("day").unwrap(), ["MON", "TUE"]);
        assert_eq!(store.category_names().collect::<Vec<_>>(), vec!["day", "month"]);
        assert!(store.category("week").is_none());
    }

    #[test]
    fn test_translated_value_detection() {
        let mut store = TranslationStore::new();
        store.insert(DEFAULT_CATEGORY, "Continue", "继续");

        assert!(store.is_translated_value("继续"));
        assert!(!store.is_translated_value("Continue"));
        assert!(!store.is_translated_value("   "));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let mut store = TranslationStore::new();
        store.insert("a", "Yes", "是");
        store.insert("a", "yes", "好");

        assert_eq!(store.get("YES"), Some("好"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.category("a").unwrap().len(), 2);
    }

    #[test]
    fn test_define_category_and_clear() {
        let mut store = TranslationStore::new();
        store.define_category("ticker", vec!["一".to_string(), "二".to_string()]);
        assert_eq!(store.category("ticker").unwrap().len(), 2);
        assert!(store.is_translated_value("二"));

        store.clear();
        assert!(store.category("ticker").is_none());
        assert!(store.is_empty());
    }
}
