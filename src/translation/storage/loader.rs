//! 翻译数据文件加载器
//!
//! 行格式（UTF-8）：
//!
//! ```text
//! # 注释
//! [Day]
//! Monday = 星期一
//! Day {0} = 第{0}天
//! Long key
//! =
//! 多行形式的译文\n第二行
//! ```
//!
//! 只有以 `[` 开头、以 `]` 结尾且不含未转义 `=` 的行才是分类头。
//!
//! 含占位符（或 `re:` 前缀）的键不进入词典，而是作为模板定义交给模式
//! 引擎；它们也不进入分类的有序译文列表，因此数组分类的下标只由普通
//! 条目按出现顺序决定。
//! 格式错误的行会被记录并跳过，其余内容照常加载。

use std::path::Path;

use crate::translation::error::{helpers, TranslationResult};
use crate::translation::storage::store::{TranslationStore, DEFAULT_CATEGORY};
use crate::utils::{find_unescaped_equals, has_placeholders, unescape};

/// 正则模式键前缀
pub const REGEX_KEY_PREFIX: &str = "re:";

/// 从数据文件读出的模板定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDef {
    pub category: String,
    pub original: String,
    pub translated: String,
    pub line: usize,
}

impl PatternDef {
    /// 是否为正则表达式定义
    pub fn is_regex(&self) -> bool {
        self.original.starts_with(REGEX_KEY_PREFIX)
    }
}

/// 加载统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub entries: usize,
    pub patterns: usize,
    pub rejected: usize,
    pub categories: usize,
}

/// 一次加载的结果
#[derive(Debug, Default)]
pub struct TranslationData {
    pub store: TranslationStore,
    pub patterns: Vec<PatternDef>,
    pub report: LoadReport,
}

enum Pending {
    None,
    Key { key: String, line: usize },
    KeyEquals { key: String, line: usize },
}

/// 翻译数据解析器
pub struct TranslationLoader {
    data: TranslationData,
    category: String,
}

impl TranslationLoader {
    pub fn new() -> Self {
        Self {
            data: TranslationData::default(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// 解析整段文本
    pub fn parse_str(mut self, content: &str) -> TranslationData {
        self.feed(content);
        self.finish()
    }

    /// 依次解析多个文件，合并到同一份数据中
    pub fn parse_files<P: AsRef<Path>>(mut self, paths: &[P]) -> TranslationResult<TranslationData> {
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .map_err(|e| helpers::config_error(format!("读取翻译文件失败: {}", e)))
                .map_err(|e| e.with_context(path.display()))?;
            tracing::debug!("加载翻译文件: {}", path.display());
            self.feed(&content);
        }
        Ok(self.finish())
    }

    /// 解析一段文本；每段文本都从默认分类开始
    fn feed(&mut self, content: &str) {
        self.category = DEFAULT_CATEGORY.to_string();
        let mut pending = Pending::None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            pending = match pending {
                Pending::KeyEquals { key, line: key_line } => {
                    if line.is_empty() || line.starts_with('#') {
                        self.reject(key_line, "多行条目缺少译文");
                    } else {
                        self.add_entry(&key, line, key_line);
                    }
                    Pending::None
                }
                Pending::Key { key, line: key_line } => {
                    if line == "=" {
                        Pending::KeyEquals {
                            key,
                            line: key_line,
                        }
                    } else {
                        self.reject(key_line, format!("键 {:?} 后缺少 '='", key));
                        self.parse_line(line, line_no)
                    }
                }
                Pending::None => self.parse_line(line, line_no),
            };
        }

        if let Pending::Key { key, line } | Pending::KeyEquals { key, line } = pending {
            self.reject(line, format!("文件结束时条目 {:?} 不完整", key));
        }
    }

    fn finish(mut self) -> TranslationData {
        self.data.report.categories = self.data.store.category_names().count();
        tracing::info!(
            "翻译数据加载完成: {} 条词条, {} 个模板, {} 行被拒绝",
            self.data.report.entries,
            self.data.report.patterns,
            self.data.report.rejected
        );
        self.data
    }

    /// 解析文件
    pub fn parse_file(self, path: impl AsRef<Path>) -> TranslationResult<TranslationData> {
        self.parse_files(&[path])
    }

    fn parse_line(&mut self, line: &str, line_no: usize) -> Pending {
        if line.is_empty() || line.starts_with('#') {
            return Pending::None;
        }

        let equals = find_unescaped_equals(line);

        // 以 `[` 开头但带 `=` 的行是普通条目，例如 `[E] Use = [E] 使用`
        if equals.is_none() && line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim();
            if name.is_empty() {
                self.reject(line_no, format!("分类头格式错误: {}", line));
            } else {
                self.category = name.to_string();
            }
            return Pending::None;
        }

        match equals {
            Some(pos) => {
                let key = line[..pos].trim();
                let value = line[pos + 1..].trim();
                if key.is_empty() || value.is_empty() {
                    self.reject(line_no, "键或译文为空");
                } else {
                    self.add_entry(key, value, line_no);
                }
                Pending::None
            }
            None => Pending::Key {
                key: line.to_string(),
                line: line_no,
            },
        }
    }

    fn add_entry(&mut self, raw_key: &str, raw_value: &str, line: usize) {
        let key = unescape(raw_key);
        let value = unescape(raw_value);

        if key.starts_with(REGEX_KEY_PREFIX) || has_placeholders(&key) {
            self.data.patterns.push(PatternDef {
                category: self.category.clone(),
                original: key,
                translated: value,
                line,
            });
            self.data.report.patterns += 1;
        } else {
            self.data.store.insert(&self.category, &key, &value);
            self.data.report.entries += 1;
        }
    }

    fn reject(&mut self, line: usize, reason: impl std::fmt::Display) {
        let error = helpers::parse_error(line, reason);
        tracing::warn!("{}", error);
        self.data.report.rejected += 1;
    }
}

impl Default for TranslationLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// 便利函数：解析翻译文本
pub fn parse_translations(content: &str) -> TranslationData {
    TranslationLoader::new().parse_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_entries_and_categories() {
        let data = parse_translations(
            "# header comment\n\
             Start = 开始\n\
             \n\
             [Day]\n\
             Monday = MON\n\
             Tuesday = TUE\n",
        );

        assert_eq!(data.report.entries, 3);
        assert_eq!(data.report.rejected, 0);
        assert_eq!(data.store.get("start"), Some("开始"));
        assert_eq!(data.store.category("Day").unwrap(), ["MON", "TUE"]);
        assert_eq!(data.store.category(DEFAULT_CATEGORY).unwrap(), ["开始"]);
        assert_eq!(data.report.categories, 2);
    }

    #[test]
    fn test_multi_line_entry() {
        let data = parse_translations("A very long key\n=\n第一行\\n第二行\nNext = 下一个\n");

        assert_eq!(data.store.get("a very long key"), Some("第一行\n第二行"));
        assert_eq!(data.store.get("next"), Some("下一个"));
        assert_eq!(data.report.rejected, 0);
    }

    #[test]
    fn test_escaped_equals_in_key() {
        let data = parse_translations(r"1 \= 1 = 一等于一");
        assert_eq!(data.store.get("1 = 1"), Some("一等于一"));
    }

    #[test]
    fn test_placeholder_keys_become_patterns() {
        let data = parse_translations("[HUD]\nDay {0} = 第{0}天\nre:^(\\d+) gold$ = {0} 金币\n");

        assert_eq!(data.report.patterns, 2);
        assert_eq!(data.report.entries, 0);
        assert_eq!(data.patterns[0].original, "Day {0}");
        assert_eq!(data.patterns[0].category, "HUD");
        assert!(!data.patterns[0].is_regex());
        assert!(data.patterns[1].is_regex());
        assert!(data.store.category("HUD").is_none());
    }

    #[test]
    fn test_bracketed_key_is_an_entry() {
        let data = parse_translations("[Keys]\n[E] Use = [E] 使用\n[]\n");

        assert_eq!(data.report.entries, 1);
        assert_eq!(data.report.rejected, 1);
        assert_eq!(data.store.get("[E] Use"), Some("[E] 使用"));
        assert_eq!(data.store.category("Keys").unwrap(), ["[E] 使用"]);
    }

    #[test]
    fn test_pattern_lines_do_not_shift_category_indices() {
        let data = parse_translations("[News]\nFirst = 一\nItem {0} = 条目{0}\nSecond = 二\n");

        assert_eq!(data.report.patterns, 1);
        assert_eq!(data.store.category("News").unwrap(), ["一", "二"]);
        assert_eq!(data.patterns[0].category, "News");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let data = parse_translations(
            "[Broken\n\
             Orphan key\n\
             Good = 好\n\
             = no key\n\
             Dangling\n",
        );

        assert_eq!(data.store.get("good"), Some("好"));
        assert_eq!(data.report.entries, 1);
        // [Broken, Orphan key, "= no key", Dangling
        assert_eq!(data.report.rejected, 4);
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, "Quit = 退出\n".as_bytes()).unwrap();

        let data = TranslationLoader::new().parse_file(file.path()).unwrap();
        assert_eq!(data.store.get("quit"), Some("退出"));

        let missing = TranslationLoader::new().parse_file("/nonexistent/zh.txt");
        assert!(missing.is_err());
    }

    #[test]
    fn test_parse_files_resets_category_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        let second = dir.path().join("b.txt");
        std::fs::write(&first, "[Day]\nMonday = MON\n").unwrap();
        std::fs::write(&second, "Quit = 退出\n").unwrap();

        let data = TranslationLoader::new().parse_files(&[first, second]).unwrap();
        assert_eq!(data.store.category("Day").unwrap(), ["MON"]);
        assert_eq!(data.store.category(DEFAULT_CATEGORY).unwrap(), ["退出"]);
        assert_eq!(data.report.entries, 2);
    }
}
