//! # 工具模块
//!
//! 文本层面的小工具函数：
//!
//! - 查找键规范化
//! - 翻译数据中的转义序列处理
//! - 位置占位符 `{0}`..`{9}` 的扫描

/// 规范化查找键：去除首尾空白、删除所有空白字符并转小写
///
/// 纯函数，同一源文本总是得到同一结果。
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 还原 `\n` 与 `\=` 转义
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('=') => {
                out.push('=');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// 查找第一个未被 `\` 转义的 `=` 的字节位置
pub fn find_unescaped_equals(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'=' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// 文本中的一个位置占位符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    /// 占位符数字 0..=9
    pub index: usize,
    /// `{` 的字节位置
    pub start: usize,
    /// `}` 之后的字节位置
    pub end: usize,
}

/// 按出现顺序扫描 `{d}` 形式的占位符
pub fn scan_placeholders(text: &str) -> Vec<Placeholder> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i + 2 < bytes.len() {
        if bytes[i] == b'{' && bytes[i + 1].is_ascii_digit() && bytes[i + 2] == b'}' {
            found.push(Placeholder {
                index: (bytes[i + 1] - b'0') as usize,
                start: i,
                end: i + 3,
            });
            i += 3;
        } else {
            i += 1;
        }
    }
    found
}

/// 判断文本是否包含任意位置占位符
pub fn has_placeholders(text: &str) -> bool {
    !scan_placeholders(text).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Hello World \n"), "helloworld");
        assert_eq!(normalize("MON"), normalize(" m o n "));
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"line1\nline2"), "line1\nline2");
        assert_eq!(unescape(r"a \= b"), "a = b");
        assert_eq!(unescape(r"C:\path"), r"C:\path");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_find_unescaped_equals() {
        assert_eq!(find_unescaped_equals("key = value"), Some(4));
        assert_eq!(find_unescaped_equals(r"1 \= 2 = yes"), Some(7));
        assert_eq!(find_unescaped_equals(r"no \= here"), None);
    }

    #[test]
    fn test_scan_placeholders() {
        let found = scan_placeholders("A{0}B{1}C");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], Placeholder { index: 0, start: 1, end: 4 });
        assert_eq!(found[1].index, 1);

        assert!(scan_placeholders("{a} {10} {").is_empty());
        assert!(has_placeholders("Day {0}"));
    }
}
