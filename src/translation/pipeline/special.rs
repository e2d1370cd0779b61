//! 内置特殊情况
//!
//! 一些常见的界面文本形状（“标签: 值”、多行文本、富文本标签包裹）无法用
//! 单条模板描述，这里以自定义回调模板的形式提供，注册在模板列表末尾。

use crate::translation::config::constants;
use crate::translation::storage::TranslationStore;

use super::pattern::{PatternMode, TranslationPattern};

/// 特殊情况处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialCase {
    /// `标签: 值`，只翻译标签
    ColonPair,
    /// 多行文本逐行查词典
    Lines,
    /// `<tag>内容</tag>`，只翻译内容
    RichText,
}

impl SpecialCase {
    pub fn name(&self) -> &'static str {
        match self {
            SpecialCase::ColonPair => "colon-pair",
            SpecialCase::Lines => "lines",
            SpecialCase::RichText => "rich-text",
        }
    }

    /// 文本是否具有该形状
    pub fn matches_shape(&self, text: &str) -> bool {
        match self {
            SpecialCase::ColonPair => text.contains(':') || text.contains('：'),
            SpecialCase::Lines => text.contains('\n'),
            SpecialCase::RichText => text.starts_with('<') && text.ends_with('>'),
        }
    }

    /// 执行改写；没有任何部分被翻译时返回 `None`
    pub fn apply(&self, text: &str, store: &TranslationStore) -> Option<String> {
        match self {
            SpecialCase::ColonPair => translate_colon_pair(text, store),
            SpecialCase::Lines => translate_lines(text, store),
            SpecialCase::RichText => translate_rich_text(text, store),
        }
    }

    /// 转换为自定义回调模板
    pub fn to_pattern(self) -> TranslationPattern {
        TranslationPattern::custom(self.name(), move |text, _path, store| self.apply(text, store))
            .with_text_predicate(move |text| self.matches_shape(text))
    }

    /// 只在路径包含 `fragment` 的节点上生效的模板
    pub fn scoped_pattern(self, fragment: &str) -> TranslationPattern {
        let fragment = fragment.to_string();
        let name = format!("{}@{}", self.name(), fragment);
        TranslationPattern::custom(&name, move |text, _path, store| self.apply(text, store))
            .with_text_predicate(move |text| self.matches_shape(text))
            .with_path_predicate(move |path| path.contains(fragment.as_str()))
    }
}

/// 内置模板，按优先级排列
pub fn builtin_patterns() -> Vec<TranslationPattern> {
    let mut patterns: Vec<TranslationPattern> = [
        SpecialCase::RichText,
        SpecialCase::Lines,
        SpecialCase::ColonPair,
    ]
    .into_iter()
    .map(SpecialCase::to_pattern)
    .collect();

    match TranslationPattern::compile("", "", PatternMode::CommaList) {
        Ok(pattern) => patterns.push(
            pattern.with_text_predicate(|text| text.contains(constants::LIST_SEPARATOR)),
        ),
        Err(e) => tracing::error!("内置逗号列表模板编译失败: {}", e),
    }

    patterns
}

fn translate_colon_pair(text: &str, store: &TranslationStore) -> Option<String> {
    let (pos, separator) = text
        .char_indices()
        .find(|(_, c)| *c == ':' || *c == '：')?;
    let label = &text[..pos];
    let rest = &text[pos + separator.len_utf8()..];

    let translated = store.get(label.trim())?;
    let leading = &label[..label.len() - label.trim_start().len()];
    Some(format!("{}{}{}{}", leading, translated, separator, rest))
}

fn translate_lines(text: &str, store: &TranslationStore) -> Option<String> {
    let mut any = false;
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| match store.get(line) {
            Some(value) if !line.trim().is_empty() => {
                any = true;
                value.to_string()
            }
            _ => line.to_string(),
        })
        .collect();

    any.then(|| lines.join("\n"))
}

fn translate_rich_text(text: &str, store: &TranslationStore) -> Option<String> {
    let open_end = text.find('>')? + 1;
    let close_start = text.rfind("</")?;
    if close_start < open_end {
        return None;
    }

    let inner = &text[open_end..close_start];
    let translated = store.get(inner)?;
    Some(format!(
        "{}{}{}",
        &text[..open_end],
        translated,
        &text[close_start..]
    ))
}
