//! 外部转储/装载工具的发现。
//!
//! 顺序：显式配置路径 -> 固定的常见安装位置 -> PATH。
//! 找不到不是错误，由调用方决定回退或报错。

use crate::config::{PerformanceConfig, RestoreConfig};
use crate::constants::tool;
use std::path::{Path, PathBuf};

/// 定位 mysqldump。找不到返回None（触发流式回退）。
pub fn locate_mysqldump(performance: &PerformanceConfig) -> Option<PathBuf> {
    locate(performance.mysqldump_path.as_deref(), tool::MYSQLDUMP_CANDIDATES, tool::MYSQLDUMP_BIN)
}

/// 定位 mysql 客户端（恢复装载用）。
pub fn locate_mysql(restore: &RestoreConfig) -> Option<PathBuf> {
    locate(restore.mysql_path.as_deref(), tool::MYSQL_CANDIDATES, tool::MYSQL_BIN)
}

fn locate(configured: Option<&str>, candidates: &[&str], bin_name: &str) -> Option<PathBuf> {
    if let Some(path) = configured {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    for candidate in candidates {
        let path = Path::new(candidate);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }

    which::which(bin_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let performance = PerformanceConfig {
            mysqldump_path: Some("/opt/custom/mysqldump".to_string()),
            ..PerformanceConfig::default()
        };
        assert_eq!(
            locate_mysqldump(&performance),
            Some(PathBuf::from("/opt/custom/mysqldump"))
        );
    }

    #[test]
    fn test_empty_configured_path_falls_through() {
        let restore = RestoreConfig {
            enabled: true,
            mysql_path: Some(String::new()),
        };
        // 空字符串视同未配置；结果取决于环境，但不得返回空路径
        if let Some(found) = locate_mysql(&restore) {
            assert!(!found.as_os_str().is_empty());
        }
    }
}
