//! 文本翻译入口
//!
//! 过滤 → 是否已是译文 → 词典直查 → 模式引擎。

use crate::host::TextHolder;
use crate::translation::storage::TranslationStore;

use super::engine::PatternEngine;
use super::filters::TextFilter;

/// 单次翻译的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateOutcome {
    /// 得到与原文不同的译文
    Translated(String),
    /// 文本已经是译文，或改写结果与原文相同
    AlreadyTranslated,
    /// 过滤器拒绝或没有任何规则命中
    NoMatch,
}

impl TranslateOutcome {
    /// 节点是否可以视为“已翻译”
    pub fn is_success(&self) -> bool {
        !matches!(self, TranslateOutcome::NoMatch)
    }
}

/// 词典与模式引擎的组合
pub struct Translator {
    store: TranslationStore,
    patterns: PatternEngine,
    filter: TextFilter,
}

impl Translator {
    pub fn new(store: TranslationStore, patterns: PatternEngine) -> Self {
        Self {
            store,
            patterns,
            filter: TextFilter::new(),
        }
    }

    pub fn with_filter(mut self, filter: TextFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// 替换词典；调用方必须先重置模式引擎
    pub fn replace_store(&mut self, store: TranslationStore) -> TranslationStore {
        std::mem::replace(&mut self.store, store)
    }

    pub fn patterns(&self) -> &PatternEngine {
        &self.patterns
    }

    pub fn patterns_mut(&mut self) -> &mut PatternEngine {
        &mut self.patterns
    }

    /// 翻译一段文本
    pub fn translate(&mut self, text: &str, path: &str) -> TranslateOutcome {
        if !self.filter.should_translate(text) {
            return TranslateOutcome::NoMatch;
        }

        if self.store.is_translated_value(text) {
            return TranslateOutcome::AlreadyTranslated;
        }

        let rewritten = match self.store.get(text) {
            Some(value) => Some(value.to_string()),
            None => self.patterns.try_match(text, path, &self.store),
        };

        match rewritten {
            Some(output) if output == text => TranslateOutcome::AlreadyTranslated,
            Some(output) => TranslateOutcome::Translated(output),
            None => TranslateOutcome::NoMatch,
        }
    }

    /// 原地翻译字符串，只有内容实际变化时才写入并返回 `true`
    pub fn apply(&mut self, text: &mut String, path: &str) -> bool {
        match self.translate(text, path) {
            TranslateOutcome::Translated(output) => {
                *text = output;
                true
            }
            _ => false,
        }
    }

    /// 原地翻译字符串容器，返回是否有任何部分变化
    pub fn translate_holder(&mut self, holder: &mut TextHolder, path: &str) -> bool {
        match holder {
            TextHolder::Plain(text) => self.apply(text, path),
            TextHolder::Lines(lines) => {
                let mut changed = false;
                for line in lines.iter_mut() {
                    changed |= self.apply(line, path);
                }
                changed
            }
            TextHolder::Rich { inner, .. } => self.apply(inner, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::pipeline::pattern::PatternMode;

    fn translator() -> Translator {
        let mut store = TranslationStore::new();
        store.insert("ui", "Start Game", "开始游戏");
        store.insert("ui", "Quit", "退出");
        let mut patterns = PatternEngine::default();
        patterns.add("Day {0}", "第{0}天", PatternMode::Template);
        Translator::new(store, patterns)
    }

    #[test]
    fn test_translate_direct_and_pattern() {
        let mut t = translator();
        assert_eq!(
            t.translate("  start game ", ""),
            TranslateOutcome::Translated("开始游戏".to_string())
        );
        assert_eq!(
            t.translate("Day 12", ""),
            TranslateOutcome::Translated("第12天".to_string())
        );
        assert_eq!(t.translate("Unknown", ""), TranslateOutcome::NoMatch);
        assert_eq!(t.translate("42", ""), TranslateOutcome::NoMatch);
    }

    #[test]
    fn test_translate_is_idempotent() {
        let mut t = translator();
        let mut text = "Quit".to_string();
        assert!(t.apply(&mut text, ""));
        assert_eq!(text, "退出");

        assert!(!t.apply(&mut text, ""));
        assert_eq!(t.translate(&text, ""), TranslateOutcome::AlreadyTranslated);
    }

    #[test]
    fn test_rewrite_equal_to_input_is_already_translated() {
        let mut t = translator();
        t.patterns_mut().add("{0}!", "{0}!", PatternMode::Template);
        assert_eq!(t.translate("Hey!", ""), TranslateOutcome::AlreadyTranslated);
    }

    #[test]
    fn test_translate_holder_variants() {
        let mut t = translator();

        let mut lines = TextHolder::Lines(vec!["Quit".to_string(), "Stay".to_string()]);
        assert!(t.translate_holder(&mut lines, ""));
        assert_eq!(lines.render(), "退出\nStay");

        let mut rich = TextHolder::Rich {
            open: "<b>".to_string(),
            inner: "Start Game".to_string(),
            close: "</b>".to_string(),
        };
        assert!(t.translate_holder(&mut rich, ""));
        assert_eq!(rich.render(), "<b>开始游戏</b>");

        let mut plain = TextHolder::Plain("Nope".to_string());
        assert!(!t.translate_holder(&mut plain, ""));
    }
}
