//! 表名跳过规则。
//!
//! 配置兼容性要求精确保留的判别规则：
//! 模式以 `/` 开头按正则解释（剥去定界符），否则按大小写不敏感的
//! 字面量比较。命中的表从转储输出与快速路径排除清单中整体消失。

use regex::Regex;

enum SkipPattern {
    Regex(Regex),
    Literal(String),
}

pub struct SkipFilter {
    patterns: Vec<SkipPattern>,
}

impl SkipFilter {
    /// 由配置的模式列表构建过滤器。
    /// 非法正则打警告后丢弃（与原有行为一致：匹配失败视同未命中）。
    pub fn new(patterns: &[String]) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            if pattern.is_empty() {
                continue;
            }
            if let Some(stripped) = pattern.strip_prefix('/') {
                let body = stripped.strip_suffix('/').unwrap_or(stripped);
                match Regex::new(body) {
                    Ok(re) => compiled.push(SkipPattern::Regex(re)),
                    Err(e) => {
                        tracing::warn!("跳过规则 {pattern} 不是合法正则，忽略: {e}");
                    }
                }
            } else {
                compiled.push(SkipPattern::Literal(pattern.clone()));
            }
        }

        Self { patterns: compiled }
    }

    /// 表是否命中任一跳过规则
    pub fn matches(&self, table: &str) -> bool {
        self.patterns.iter().any(|p| match p {
            SkipPattern::Regex(re) => re.is_match(table),
            SkipPattern::Literal(lit) => lit.eq_ignore_ascii_case(table),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(patterns: &[&str]) -> SkipFilter {
        let owned: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        SkipFilter::new(&owned)
    }

    #[test]
    fn test_regex_pattern() {
        let f = filter(&["/^log_/", "sessions"]);
        assert!(f.matches("log_2024"));
        assert!(!f.matches("audit_log"));
    }

    #[test]
    fn test_literal_case_insensitive() {
        let f = filter(&["/^log_/", "sessions"]);
        assert!(f.matches("Sessions"));
        assert!(f.matches("SESSIONS"));
    }

    #[test]
    fn test_unmatched_table() {
        let f = filter(&["/^log_/", "sessions"]);
        assert!(!f.matches("orders"));
    }

    #[test]
    fn test_empty_and_invalid_patterns_ignored() {
        let f = filter(&["", "/((/", "cache_data"]);
        assert!(f.matches("cache_data"));
        assert!(!f.matches("anything_else"));
    }

    #[test]
    fn test_regex_is_case_sensitive() {
        // 正则分支不做大小写折叠，与字面量分支相反
        let f = filter(&["/^log_/"]);
        assert!(!f.matches("LOG_2024"));
    }
}
