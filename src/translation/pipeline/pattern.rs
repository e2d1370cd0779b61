//! 翻译模板
//!
//! 一条模板描述“识别原文模式 P，输出译文模板 T”。原文模板在构造时被
//! 拆分为占位符 `{0}`..`{9}` 之间的静态片段，之后不再改变。
//!
//! 模板提取是贪婪、从左到右、不回溯的：除首尾片段外，每个片段都以
//! “在剩余文本中首次出现的位置”作为边界。若边界片段的文本恰好出现在
//! 参数值内部，提取结果会偏短；这种歧义被原样保留。

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::translation::config::constants;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::storage::TranslationStore;
use crate::utils::scan_placeholders;

/// 模板模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternMode {
    /// 模板提取，参数原样代入
    Template,
    /// 模板提取，参数先查词典再代入
    TemplateTranslated,
    /// 正则表达式提取
    Regex,
    /// 逗号分隔列表逐项翻译
    CommaList,
    /// 自定义回调
    Custom,
}

impl fmt::Display for PatternMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternMode::Template => "template",
            PatternMode::TemplateTranslated => "template-translated",
            PatternMode::Regex => "regex",
            PatternMode::CommaList => "comma-list",
            PatternMode::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// 自定义回调：(文本, 路径, 词典) → 译文
pub type CustomFn = Arc<dyn Fn(&str, &str, &TranslationStore) -> Option<String> + Send + Sync>;

/// 对路径或文本的过滤谓词
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// 模板去重签名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSignature {
    pub mode: PatternMode,
    pub original: String,
    pub translated: String,
}

/// 拆分后的模板：`fragments[i]` 与 `fragments[i + 1]` 之间是占位符 `slots[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    fragments: Vec<String>,
    slots: Vec<usize>,
}

impl Template {
    /// 拆分任意顺序的占位符（用于译文模板）
    pub fn parse(text: &str) -> Self {
        let mut fragments = Vec::new();
        let mut slots = Vec::new();
        let mut last = 0;

        for placeholder in scan_placeholders(text) {
            fragments.push(text[last..placeholder.start].to_string());
            slots.push(placeholder.index);
            last = placeholder.end;
        }
        fragments.push(text[last..].to_string());

        Self { fragments, slots }
    }

    /// 拆分原文模板，要求占位符按 `{0}`、`{1}`… 升序且不缺号
    pub fn parse_original(text: &str) -> TranslationResult<Self> {
        let template = Self::parse(text);

        if template.slots.is_empty() {
            return Err(helpers::pattern_error(format!("原文模板没有占位符: {:?}", text)));
        }

        for (expected, &actual) in template.slots.iter().enumerate() {
            if expected != actual {
                return Err(helpers::pattern_error(format!(
                    "原文模板占位符必须按升序出现，位置 {} 期望 {{{}}} 实际 {{{}}}: {:?}",
                    expected, expected, actual, text
                )));
            }
        }

        Ok(template)
    }

    /// 占位符数量
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// 模板中引用到的最大占位符编号
    pub fn max_slot(&self) -> Option<usize> {
        self.slots.iter().copied().max()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// 从文本中提取参数值；任一边界找不到或结尾片段不是后缀时返回 `None`
    pub fn extract(&self, text: &str) -> Option<Vec<String>> {
        let (first, rest_fragments) = self.fragments.split_first()?;
        let (last, boundaries) = rest_fragments.split_last()?;

        let mut rest = text.strip_prefix(first.as_str())?;
        let mut values = Vec::with_capacity(self.slots.len());

        for boundary in boundaries {
            let pos = rest.find(boundary.as_str())?;
            values.push(rest[..pos].to_string());
            rest = &rest[pos + boundary.len()..];
        }

        let value = rest.strip_suffix(last.as_str())?;
        values.push(value.to_string());

        Some(values)
    }

    /// 代入参数值；缺失的编号保留占位符原文
    pub fn render(&self, values: &[String]) -> String {
        let mut out = String::new();
        for (i, fragment) in self.fragments.iter().enumerate() {
            out.push_str(fragment);
            if let Some(&slot) = self.slots.get(i) {
                match values.get(slot) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&format!("{{{}}}", slot)),
                }
            }
        }
        out
    }
}

/// 一条可执行的翻译模板
#[derive(Clone)]
pub struct TranslationPattern {
    mode: PatternMode,
    original: String,
    translated: String,
    original_template: Option<Template>,
    translated_template: Template,
    regex: Option<Regex>,
    callback: Option<CustomFn>,
    path_predicate: Option<Predicate>,
    text_predicate: Option<Predicate>,
}

impl fmt::Debug for TranslationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationPattern")
            .field("mode", &self.mode)
            .field("original", &self.original)
            .field("translated", &self.translated)
            .field("has_path_predicate", &self.path_predicate.is_some())
            .field("has_text_predicate", &self.text_predicate.is_some())
            .finish()
    }
}

impl TranslationPattern {
    /// 编译模板
    ///
    /// `Custom` 模式需要回调，请使用 [`TranslationPattern::custom`]。
    pub fn compile(original: &str, translated: &str, mode: PatternMode) -> TranslationResult<Self> {
        let translated_template = Template::parse(translated);
        let mut pattern = Self {
            mode,
            original: original.to_string(),
            translated: translated.to_string(),
            original_template: None,
            translated_template,
            regex: None,
            callback: None,
            path_predicate: None,
            text_predicate: None,
        };

        match mode {
            PatternMode::Template | PatternMode::TemplateTranslated => {
                let template = Template::parse_original(original)?;
                if let Some(max) = pattern.translated_template.max_slot() {
                    if max >= template.arity() {
                        return Err(helpers::pattern_error(format!(
                            "译文引用了不存在的占位符 {{{}}}: {:?}",
                            max, translated
                        )));
                    }
                }
                pattern.original_template = Some(template);
            }
            PatternMode::Regex => {
                let regex = Regex::new(&format!("^(?:{})$", original))
                    .map_err(|e| TranslationError::from(e).with_context(original))?;
                let groups = regex.captures_len() - 1;
                if let Some(max) = pattern.translated_template.max_slot() {
                    if max >= groups.min(constants::MAX_PLACEHOLDERS) {
                        return Err(helpers::pattern_error(format!(
                            "译文引用了不存在的捕获组 {{{}}}（共 {} 组）: {:?}",
                            max, groups, original
                        )));
                    }
                }
                pattern.regex = Some(regex);
            }
            PatternMode::CommaList => {}
            PatternMode::Custom => {
                return Err(helpers::pattern_error("自定义模式必须提供回调"));
            }
        }

        Ok(pattern)
    }

    /// 创建自定义回调模板，`name` 作为签名中的原文部分
    pub fn custom<F>(name: &str, callback: F) -> Self
    where
        F: Fn(&str, &str, &TranslationStore) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            mode: PatternMode::Custom,
            original: name.to_string(),
            translated: String::new(),
            original_template: None,
            translated_template: Template::parse(""),
            regex: None,
            callback: Some(Arc::new(callback)),
            path_predicate: None,
            text_predicate: None,
        }
    }

    /// 附加路径谓词
    pub fn with_path_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.path_predicate = Some(Arc::new(predicate));
        self
    }

    /// 附加文本谓词
    pub fn with_text_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.text_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn mode(&self) -> PatternMode {
        self.mode
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn translated(&self) -> &str {
        &self.translated
    }

    pub fn signature(&self) -> PatternSignature {
        PatternSignature {
            mode: self.mode,
            original: self.original.clone(),
            translated: self.translated.clone(),
        }
    }

    /// 谓词预检（廉价拒绝）
    pub fn accepts(&self, text: &str, path: &str) -> bool {
        if let Some(predicate) = &self.path_predicate {
            if !predicate(path) {
                return false;
            }
        }
        if let Some(predicate) = &self.text_predicate {
            if !predicate(text) {
                return false;
            }
        }
        true
    }

    /// 尝试改写文本
    pub fn apply(&self, text: &str, path: &str, store: &TranslationStore) -> Option<String> {
        if !self.accepts(text, path) {
            return None;
        }

        match self.mode {
            PatternMode::Template => {
                let values = self.original_template.as_ref()?.extract(text)?;
                Some(self.translated_template.render(&values))
            }
            PatternMode::TemplateTranslated => {
                let values: Vec<String> = self
                    .original_template
                    .as_ref()?
                    .extract(text)?
                    .into_iter()
                    .map(|value| match store.get(&value) {
                        Some(translated) => translated.to_string(),
                        None => value,
                    })
                    .collect();
                Some(self.translated_template.render(&values))
            }
            PatternMode::Regex => {
                let captures = self.regex.as_ref()?.captures(text)?;
                let values: Vec<String> = (1..captures.len())
                    .map(|i| {
                        captures
                            .get(i)
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                let rendered = self.translated_template.render(&values);
                Some(resolve_named_tokens(&rendered, store))
            }
            PatternMode::CommaList => translate_comma_list(text, store),
            PatternMode::Custom => {
                let callback = self.callback.as_ref()?;
                callback(text, path, store)
            }
        }
    }
}

/// 把 `{UPPERNAME}` 形式的记号替换为词典译文；查不到时保留原记号
fn resolve_named_tokens(text: &str, store: &TranslationStore) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let is_token = name_len > 0
            && name.starts_with(|c: char| c.is_ascii_uppercase())
            && after[name_len..].starts_with('}');

        if is_token {
            match store.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[name_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// 逗号列表逐项查词典；没有任何一项被翻译时返回 `None`
fn translate_comma_list(text: &str, store: &TranslationStore) -> Option<String> {
    let mut any = false;
    let parts: Vec<String> = text
        .split(constants::LIST_SEPARATOR)
        .map(|token| {
            let token = token.trim();
            match store.get(token) {
                Some(value) if !token.is_empty() => {
                    any = true;
                    value.to_string()
                }
                _ => token.to_string(),
            }
        })
        .collect();

    any.then(|| parts.join(constants::LIST_JOINER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TranslationStore {
        let mut store = TranslationStore::new();
        store.insert("test", "Iron", "铁");
        store.insert("test", "Copper", "铜");
        store.insert("test", "GOLD", "金");
        store
    }

    #[test]
    fn test_template_round_trip() {
        let template = Template::parse_original("A{0}B{1}C").unwrap();
        let values = template.extract("AxByC").unwrap();
        assert_eq!(values, vec!["x".to_string(), "y".to_string()]);

        let translated = Template::parse("Ä{0}Ö{1}Ü");
        assert_eq!(translated.render(&values), "ÄxÖyÜ");
    }

    #[test]
    fn test_template_rejects_missing_boundary_or_suffix() {
        let template = Template::parse_original("Day {0} of {1}").unwrap();
        assert!(template.extract("Day 3 from 7").is_none());
        assert!(template.extract("Night 3 of 7").is_none());

        let template = Template::parse_original("{0} left!").unwrap();
        assert!(template.extract("3 left").is_none());
        assert_eq!(template.extract("3 left!").unwrap(), vec!["3".to_string()]);
    }

    #[test]
    fn test_template_extraction_is_greedy_left_to_right() {
        // 边界片段出现在第一个参数值内部时，第一个值被截短
        let template = Template::parse_original("{0} and {1}").unwrap();
        let values = template.extract("salt and pepper and oil").unwrap();
        assert_eq!(values, vec!["salt".to_string(), "pepper and oil".to_string()]);
    }

    #[test]
    fn test_parse_original_validation() {
        assert!(Template::parse_original("no placeholders").is_err());
        assert!(Template::parse_original("{1} before {0}").is_err());
        assert!(Template::parse_original("{0} and {2}").is_err());
        assert_eq!(Template::parse_original("{0}{1}").unwrap().arity(), 2);
    }

    #[test]
    fn test_translated_template_may_reorder() {
        let pattern =
            TranslationPattern::compile("{0} of {1}", "{1}的{0}", PatternMode::Template).unwrap();
        assert_eq!(
            pattern.apply("Sword of Fire", "", &TranslationStore::new()),
            Some("Fire的Sword".to_string())
        );
    }

    #[test]
    fn test_compile_rejects_unknown_slot() {
        assert!(TranslationPattern::compile("{0} gold", "{1} 金", PatternMode::Template).is_err());
        assert!(TranslationPattern::compile("(\\d+)", "{1}", PatternMode::Regex).is_err());
        assert!(TranslationPattern::compile("([a-z", "{0}", PatternMode::Regex).is_err());
        assert!(TranslationPattern::compile("x", "y", PatternMode::Custom).is_err());
    }

    #[test]
    fn test_template_translated_looks_up_captures() {
        let pattern = TranslationPattern::compile(
            "Found {0} x{1}",
            "发现 {0} ×{1}",
            PatternMode::TemplateTranslated,
        )
        .unwrap();

        assert_eq!(
            pattern.apply("Found Iron x3", "", &store()),
            Some("发现 铁 ×3".to_string())
        );
        assert_eq!(
            pattern.apply("Found Wood x3", "", &store()),
            Some("发现 Wood ×3".to_string())
        );
    }

    #[test]
    fn test_regex_mode_with_named_tokens() {
        let pattern = TranslationPattern::compile(
            r"(\d+) (\w+) coins",
            "{0} {GOLD}币 ({1}) {MISSING}",
            PatternMode::Regex,
        )
        .unwrap();

        assert_eq!(
            pattern.apply("12 shiny coins", "", &store()),
            Some("12 金币 (shiny) {MISSING}".to_string())
        );
        assert!(pattern.apply("a 12 shiny coins", "", &store()).is_none());
    }

    #[test]
    fn test_comma_list_mode() {
        let pattern = TranslationPattern::compile("", "", PatternMode::CommaList).unwrap();
        assert_eq!(
            pattern.apply("Iron,Copper , Tin", "", &store()),
            Some("铁, 铜, Tin".to_string())
        );
        assert!(pattern.apply("Tin, Lead", "", &store()).is_none());
    }

    #[test]
    fn test_custom_mode_and_predicates() {
        let pattern = TranslationPattern::custom("shout", |text, _path, _store| {
            Some(text.to_uppercase())
        })
        .with_path_predicate(|path| path.contains("Dialog"))
        .with_text_predicate(|text| text.ends_with('!'));

        assert_eq!(
            pattern.apply("hey!", "UI/Dialog/Line", &TranslationStore::new()),
            Some("HEY!".to_string())
        );
        assert!(pattern.apply("hey!", "UI/HUD", &TranslationStore::new()).is_none());
        assert!(pattern.apply("hey", "UI/Dialog", &TranslationStore::new()).is_none());
        assert_eq!(pattern.signature().mode, PatternMode::Custom);
        assert_eq!(pattern.signature().original, "shout");
    }

    #[test]
    fn test_resolve_named_tokens_edge_cases() {
        let store = store();
        assert_eq!(resolve_named_tokens("{GOLD}{", &store), "金{");
        assert_eq!(resolve_named_tokens("{lower} {0} {GOLD", &store), "{lower} {0} {GOLD");
    }
}
